//! Reactions, follows and the startup subscription pass.

use tracing::{debug, info, warn};

use super::{CycleError, Orchestrator};
use crate::feed::Candidate;
use crate::heuristics::Reaction;
use crate::store::Relations;

impl Orchestrator {
    /// Maybe like or downvote a candidate that got no reply.
    pub(super) async fn react(&mut self, candidate: &Candidate) -> Result<(), CycleError> {
        let Some(reaction) =
            self.selector
                .reaction_for(candidate, self.store.as_ref(), &mut self.rng)?
        else {
            return Ok(());
        };

        if self.config.agent.dry_run {
            info!(post_id = %candidate.id, reaction = ?reaction, "[dry run] Would react");
            self.store.mark_reacted(&candidate.id)?;
            return Ok(());
        }

        let applied = match reaction {
            Reaction::Like => self.reactor.like(&candidate.id).await,
            Reaction::Downvote => self.reactor.downvote(&candidate.id).await,
        };
        if !applied {
            return Ok(());
        }

        self.store.mark_reacted(&candidate.id)?;
        info!(post_id = %candidate.id, reaction = ?reaction, "Reacted");

        if reaction == Reaction::Like {
            self.credit_author(candidate).await?;
        }
        Ok(())
    }

    /// Tally a like against the author and follow them once the tally
    /// reaches the threshold. The follow mark is written first so the
    /// follow is attempted exactly once.
    async fn credit_author(&self, candidate: &Candidate) -> Result<(), CycleError> {
        let Some(author) = candidate.author_name() else {
            return Ok(());
        };

        let relations = Relations::new(self.store.as_ref());
        let tally = relations.record_upvote(author)?;
        if tally < self.config.reactions.follow_threshold || relations.is_followed(author)? {
            debug!(agent = author, tally, "Upvote tallied");
            return Ok(());
        }

        relations.add_follow(author)?;
        let followed = self.reactor.follow(author).await;
        info!(agent = author, tally, followed, "Follow threshold reached");
        Ok(())
    }

    /// Subscribe to every configured channel not yet marked subscribed.
    /// Returns how many new subscriptions were applied.
    pub async fn ensure_subscriptions(&self) -> Result<usize, CycleError> {
        let relations = Relations::new(self.store.as_ref());
        let mut added = 0;

        for channel in &self.config.feed.subscribe_channels {
            if relations.is_subscribed(channel)? {
                continue;
            }
            if self.config.agent.dry_run {
                info!(channel = %channel, "[dry run] Would subscribe");
                continue;
            }
            if self.reactor.subscribe(channel).await {
                relations.add_subscription(channel)?;
                added += 1;
                info!(channel = %channel, "Subscribed");
            } else {
                warn!(channel = %channel, "Subscription not applied");
            }
        }

        Ok(added)
    }
}
