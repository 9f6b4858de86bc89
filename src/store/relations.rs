//! Relationship state: upvote tallies, follows, subscriptions and the
//! ledger of the agent's own posts.

use super::{get_parsed, keys, StateStore, StoreError};

const MEMBER: &str = "1";

pub struct Relations<'a> {
    store: &'a dyn StateStore,
}

impl<'a> Relations<'a> {
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self { store }
    }

    pub fn upvote_tally(&self, agent: &str) -> Result<u64, StoreError> {
        Ok(get_parsed(self.store, &keys::upvotes(agent))?.unwrap_or(0))
    }

    /// Count one more upvote given to `agent`; returns the new tally.
    pub fn record_upvote(&self, agent: &str) -> Result<u64, StoreError> {
        let tally = self.upvote_tally(agent)? + 1;
        self.store.set(&keys::upvotes(agent), &tally.to_string())?;
        Ok(tally)
    }

    pub fn is_followed(&self, agent: &str) -> Result<bool, StoreError> {
        Ok(self.store.get(&keys::follow(agent))?.as_deref() == Some(MEMBER))
    }

    pub fn add_follow(&self, agent: &str) -> Result<(), StoreError> {
        self.store.set(&keys::follow(agent), MEMBER)
    }

    pub fn is_subscribed(&self, channel: &str) -> Result<bool, StoreError> {
        Ok(self.store.get(&keys::subscribed(channel))?.as_deref() == Some(MEMBER))
    }

    pub fn add_subscription(&self, channel: &str) -> Result<(), StoreError> {
        self.store.set(&keys::subscribed(channel), MEMBER)
    }

    /// Identities of the agent's own posts, oldest first.
    pub fn own_posts(&self) -> Result<Vec<String>, StoreError> {
        match self.store.get(keys::OWN_POST_IDS)? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|_| StoreError::Corrupt {
                key: keys::OWN_POST_IDS.to_string(),
                value: raw,
            }),
        }
    }

    /// Append `id` to the own-post ledger, keeping the newest `bound` entries.
    pub fn record_own_post(&self, id: &str, bound: usize) -> Result<(), StoreError> {
        let mut ids = self.own_posts()?;
        ids.retain(|existing| existing != id);
        ids.push(id.to_string());
        if ids.len() > bound {
            let excess = ids.len() - bound;
            ids.drain(..excess);
        }

        let encoded = serde_json::to_string(&ids)
            .map_err(|e| StoreError::Unavailable(format!("encoding own post ids: {}", e)))?;
        self.store.set(keys::OWN_POST_IDS, &encoded)
    }
}
