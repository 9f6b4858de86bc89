//! Candidate aggregation: fetch, merge by identity, order by priority.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::{Candidate, FeedKind, FeedSource};
use crate::config::FeedConfig;

#[derive(Debug, Clone)]
pub struct Aggregator {
    limit: usize,
    sort: String,
    search_queries: Vec<String>,
}

impl Aggregator {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            limit: config.limit,
            sort: config.sort.clone(),
            search_queries: config.search_queries.clone(),
        }
    }

    /// Fetch every source, merge and sort. The walk order is fully
    /// determined by the fetched items and `own_posts`.
    pub async fn collect<R: Rng + Send>(
        &self,
        source: &dyn FeedSource,
        own_posts: &HashSet<String>,
        rng: &mut R,
    ) -> Vec<Candidate> {
        let query = self.search_queries.choose(rng).cloned();

        let personalized = source
            .fetch(self.limit, &self.sort, FeedKind::Personalized)
            .await;

        // The global feed only stands in for an empty personalized one.
        let global = if personalized.is_empty() {
            source.fetch(self.limit, &self.sort, FeedKind::Global).await
        } else {
            Vec::new()
        };

        let searched = match query {
            Some(q) => {
                source
                    .fetch(self.limit, &self.sort, FeedKind::Search(q))
                    .await
            }
            None => Vec::new(),
        };

        debug!(
            personalized = personalized.len(),
            global = global.len(),
            searched = searched.len(),
            "Fetched candidate sources"
        );

        let mut merged = merge([personalized, global, searched]);
        prioritize(&mut merged, own_posts);
        merged
    }
}

/// Merge batches by identity; the first occurrence of an id wins.
pub fn merge<I>(batches: I) -> Vec<Candidate>
where
    I: IntoIterator<Item = Vec<Candidate>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for candidate in batches.into_iter().flatten() {
        if candidate.id.is_empty() {
            continue;
        }
        if seen.insert(candidate.id.clone()) {
            merged.push(candidate);
        }
    }

    merged
}

/// Replies to the agent's own posts first, then by ascending identity.
pub fn prioritize(candidates: &mut [Candidate], own_posts: &HashSet<String>) {
    candidates.sort_by(|a, b| {
        (priority(a, own_posts), &a.id).cmp(&(priority(b, own_posts), &b.id))
    });
}

fn priority(candidate: &Candidate, own_posts: &HashSet<String>) -> u8 {
    match &candidate.parent_id {
        Some(parent) if own_posts.contains(parent) => 0,
        _ => 1,
    }
}
