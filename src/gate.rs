//! Rate gate - daily cap and cooldown admission control
//!
//! Read-only over the store: deciding never changes state.

use std::fmt;

use chrono::{DateTime, Local};

use crate::config::CadenceConfig;
use crate::store::cadence::{day_key, unix_seconds};
use crate::store::{Cadence, StateStore, StoreError};

/// Outcome of asking whether a post may go out now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    DailyCapReached { cap: u32 },
    Cooldown { remaining_secs: u64 },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }

    /// `(allowed, reason)` pair
    pub fn as_pair(&self) -> (bool, String) {
        (self.is_allowed(), self.to_string())
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateDecision::Allowed => write!(f, "ok"),
            GateDecision::DailyCapReached { cap } => write!(f, "daily cap reached ({})", cap),
            GateDecision::Cooldown { remaining_secs } => {
                write!(f, "cooldown, {} seconds remaining", remaining_secs)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateGate {
    daily_cap: u32,
    min_interval_secs: u64,
}

impl RateGate {
    pub fn new(config: &CadenceConfig) -> Self {
        Self {
            daily_cap: config.max_posts_per_day,
            min_interval_secs: config.min_seconds_between_posts,
        }
    }

    pub fn can_post_now(
        &self,
        store: &dyn StateStore,
        now: DateTime<Local>,
    ) -> Result<GateDecision, StoreError> {
        let cadence = Cadence::new(store);

        // A counter from another day is implicitly zero.
        if cadence.daily_count_date()?.as_deref() != Some(day_key(&now).as_str()) {
            return Ok(GateDecision::Allowed);
        }

        if cadence.daily_count()? >= self.daily_cap {
            return Ok(GateDecision::DailyCapReached {
                cap: self.daily_cap,
            });
        }

        if let Some(last) = cadence.last_post_time()? {
            let elapsed = unix_seconds(&now) - last;
            let min = self.min_interval_secs as f64;
            if elapsed < min {
                return Ok(GateDecision::Cooldown {
                    remaining_secs: (min - elapsed).floor() as u64,
                });
            }
        }

        Ok(GateDecision::Allowed)
    }
}
