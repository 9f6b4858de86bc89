//! Command-line subcommands and their output formatting.

use chrono::{Local, TimeZone};
use clap::Subcommand;

use crate::gate::GateDecision;
use crate::store::cadence::CadenceSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the posting loop until interrupted (default)
    Run,

    /// Run exactly one cycle and exit
    Tick,

    /// Show persisted cadence state and the current gate decision
    Status,
}

/// Format cadence state for display
pub fn format_status(
    snapshot: &CadenceSnapshot,
    decision: &GateDecision,
    max_posts_per_day: u32,
    today: &str,
) -> String {
    let posts_today = if snapshot.daily_count_date.as_deref() == Some(today) {
        snapshot.daily_count
    } else {
        0
    };

    let mut output = String::new();
    output.push_str("Daemon Status\n");
    output.push_str("=============\n\n");

    output.push_str(&format!(
        "Posts today:    {}/{}\n",
        posts_today, max_posts_per_day
    ));
    output.push_str(&format!(
        "Last post:      {}\n",
        format_timestamp(snapshot.last_post_time)
    ));
    output.push_str(&format!(
        "Last original:  {}\n",
        format_timestamp(snapshot.last_original_post_time)
    ));
    output.push_str(&format!("Can post now:   {}\n", decision));

    output
}

fn format_timestamp(ts: Option<f64>) -> String {
    let Some(ts) = ts else {
        return "Never".to_string();
    };
    match Local.timestamp_opt(ts as i64, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{}", ts),
    }
}
