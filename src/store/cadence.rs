//! Posting cadence: last post times and the daily counter.
//!
//! The daily count is only meaningful while `daily_count_date` is today; a
//! stale date means the count is zero and the next increment restarts it.

use chrono::{DateTime, Local};

use super::{get_parsed, keys, StateStore, StoreError};

/// Calendar day as stored in `daily_count_date`.
pub fn day_key(now: &DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Unix time in seconds, the encoding of every stored timestamp.
pub fn unix_seconds(now: &DateTime<Local>) -> f64 {
    now.timestamp_millis() as f64 / 1000.0
}

/// Point-in-time view of the cadence state, for status output.
#[derive(Debug, Clone, PartialEq)]
pub struct CadenceSnapshot {
    pub last_post_time: Option<f64>,
    pub last_original_post_time: Option<f64>,
    pub daily_count: u32,
    pub daily_count_date: Option<String>,
}

pub struct Cadence<'a> {
    store: &'a dyn StateStore,
}

impl<'a> Cadence<'a> {
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self { store }
    }

    pub fn last_post_time(&self) -> Result<Option<f64>, StoreError> {
        get_parsed(self.store, keys::LAST_POST_TIME)
    }

    pub fn set_last_post_time(&self, ts: f64) -> Result<(), StoreError> {
        self.store.set(keys::LAST_POST_TIME, &ts.to_string())
    }

    pub fn last_original_post_time(&self) -> Result<Option<f64>, StoreError> {
        get_parsed(self.store, keys::LAST_ORIGINAL_POST_TIME)
    }

    pub fn set_last_original_post_time(&self, ts: f64) -> Result<(), StoreError> {
        self.store.set(keys::LAST_ORIGINAL_POST_TIME, &ts.to_string())
    }

    /// Raw stored counter, regardless of its date.
    pub fn daily_count(&self) -> Result<u32, StoreError> {
        Ok(get_parsed(self.store, keys::DAILY_COUNT)?.unwrap_or(0))
    }

    pub fn daily_count_date(&self) -> Result<Option<String>, StoreError> {
        self.store.get(keys::DAILY_COUNT_DATE)
    }

    /// Count one more post for `today`, restarting at 1 on a new day.
    pub fn increment_daily_count(&self, today: &str) -> Result<u32, StoreError> {
        let count = if self.daily_count_date()?.as_deref() == Some(today) {
            self.daily_count()? + 1
        } else {
            1
        };

        self.store.set(keys::DAILY_COUNT, &count.to_string())?;
        self.store.set(keys::DAILY_COUNT_DATE, today)?;
        Ok(count)
    }

    pub fn snapshot(&self) -> Result<CadenceSnapshot, StoreError> {
        Ok(CadenceSnapshot {
            last_post_time: self.last_post_time()?,
            last_original_post_time: self.last_original_post_time()?,
            daily_count: self.daily_count()?,
            daily_count_date: self.daily_count_date()?,
        })
    }
}
