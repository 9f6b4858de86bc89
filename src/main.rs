//! logos-daemon: autonomous posting agent for the Moltbook network
//!
//! Runs a fixed-interval loop that either publishes an original thought or
//! replies to one post from its feeds, within a daily cap and cooldown.
//!
//! See DESIGN.md for details.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use logos_daemon::cli::{format_status, Commands};
use logos_daemon::clock::{Clock, SystemClock};
use logos_daemon::config::{Config, Credentials};
use logos_daemon::cycle::{Collaborators, Orchestrator};
use logos_daemon::gate::RateGate;
use logos_daemon::generate::GeminiClient;
use logos_daemon::remote::MoltbookClient;
use logos_daemon::store::cadence::day_key;
use logos_daemon::store::{Cadence, SqliteStore, StateStore};

#[derive(Parser)]
#[command(name = "logos-daemon")]
#[command(about = "Autonomous posting daemon for the Moltbook agent network")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "logos-daemon.toml")]
    config: String,

    /// Data directory (overrides config file)
    #[arg(short, long, env = "LOGOS_DATA_DIR")]
    data_dir: Option<String>,

    /// Log what would be published without calling the platform
    #[arg(long, env = "LOGOS_DRY_RUN")]
    dry_run: bool,

    /// Only reply to posts that mention the agent
    #[arg(long, env = "LOGOS_REPLY_ONLY_IF_MENTIONED")]
    reply_only_if_mentioned: bool,

    /// Default log level; RUST_LOG directives take precedence
    #[arg(long, env = "BOT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("logos_daemon={}", cli.log_level.to_lowercase()).parse()?),
        )
        .init();

    info!("Starting logos-daemon");
    info!("Config file: {}", cli.config);

    let mut config = Config::load(Path::new(&cli.config))?;

    // Apply CLI overrides
    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = PathBuf::from(data_dir);
    }
    if cli.dry_run {
        config.agent.dry_run = true;
    }
    if cli.reply_only_if_mentioned {
        config.agent.reply_only_if_mentioned = true;
    }

    info!("Data dir: {}", config.store.data_dir.display());

    let store = Arc::new(SqliteStore::open(
        &config.store.data_dir,
        config.store.max_handled_ids,
    )?);

    let command = cli.command.unwrap_or(Commands::Run);
    if command == Commands::Status {
        let now = SystemClock.now();
        let snapshot = Cadence::new(store.as_ref()).snapshot()?;
        let decision = RateGate::new(&config.cadence).can_post_now(store.as_ref(), now)?;
        println!(
            "{}",
            format_status(
                &snapshot,
                &decision,
                config.cadence.max_posts_per_day,
                &day_key(&now)
            )
        );
        return Ok(());
    }

    let credentials = Credentials::new(
        std::env::var("MOLTBOOK_API_KEY").ok(),
        std::env::var("GEMINI_API_KEY").ok(),
    )?;

    let moltbook = Arc::new(MoltbookClient::new(
        config.moltbook.base_url.clone(),
        credentials.moltbook_api_key.clone(),
        Duration::from_secs(config.moltbook.timeout_secs),
    )?);
    let gemini = Arc::new(GeminiClient::new(
        &config.gemini,
        credentials.gemini_api_key.clone(),
    )?);

    let collaborators = Collaborators {
        feed: moltbook.clone(),
        publisher: moltbook.clone(),
        reactor: moltbook,
        generator: gemini,
    };

    let store: Arc<dyn StateStore> = store;
    let mut orchestrator = Orchestrator::new(config, store, collaborators)?;

    match command {
        Commands::Tick => {
            let outcome = orchestrator.run_cycle().await?;
            println!("{:?}", outcome);
        }
        _ => {
            orchestrator
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                        std::future::pending::<()>().await;
                    }
                })
                .await;
        }
    }

    info!("logos-daemon stopped");
    Ok(())
}
