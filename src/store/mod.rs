//! Durable bot state
//!
//! Everything the daemon remembers between ticks lives behind [`StateStore`]:
//! scalar key/value pairs (counters, timestamps, set memberships) plus two
//! bounded identity sets, handled candidates and reacted candidates.
//! Nothing is cached in memory; every read goes back to the store.

pub mod cadence;
pub mod relations;
pub mod sqlite;

use std::str::FromStr;

pub use cadence::Cadence;
pub use relations::Relations;
pub use sqlite::SqliteStore;

/// Keys of the scalar state.
pub mod keys {
    pub const LAST_POST_TIME: &str = "last_post_time";
    pub const LAST_ORIGINAL_POST_TIME: &str = "last_original_post_time";
    pub const DAILY_COUNT: &str = "daily_count";
    pub const DAILY_COUNT_DATE: &str = "daily_count_date";
    pub const OWN_POST_IDS: &str = "own_post_ids";

    pub fn upvotes(agent: &str) -> String {
        format!("upvotes:{}", agent)
    }

    pub fn follow(agent: &str) -> String {
        format!("follow:{}", agent)
    }

    pub fn subscribed(channel: &str) -> String {
        format!("subscribed:{}", channel)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt value for {key}: {value:?}")]
    Corrupt { key: String, value: String },
}

/// Key/value state plus the bounded dedup sets.
///
/// Implementations only need to be safe for one sequential writer; the
/// daemon never runs two cycles at once.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Upsert.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Record a reply to `id`, keeping only the most recently handled ids.
    fn mark_handled(&self, id: &str) -> Result<(), StoreError>;

    fn is_handled(&self, id: &str) -> Result<bool, StoreError>;

    /// Record a like/downvote on `id`, bounded like the handled set.
    fn mark_reacted(&self, id: &str) -> Result<(), StoreError>;

    fn is_reacted(&self, id: &str) -> Result<bool, StoreError>;
}

/// Read a string-encoded scalar.
pub(crate) fn get_parsed<T: FromStr>(
    store: &dyn StateStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| StoreError::Corrupt {
                key: key.to_string(),
                value,
            }),
    }
}
