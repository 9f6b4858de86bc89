//! Cycle orchestrator
//!
//! One tick walks a small state machine and performs at most one publish:
//!
//! ```text
//! Idle ─► Gate-Check ─► Prophet-Attempt ─► Hunter-Scan ─► Reply-Committed ─► Idle
//!             │                │                 │
//!             └─ denied ───────┴─ posted ────────┴─ exhausted (No-Action) ─► Idle
//! ```
//!
//! - **Prophet**: an original post on its own timer, topic drawn at random.
//! - **Hunter**: scan the merged feed and reply to the first candidate that
//!   passes the heuristics and gets a non-empty generation. Candidates that
//!   are passed over may still get a like or downvote.
//!
//! Ticks never overlap. A stop signal is only observed between ticks.

mod reactions;

use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigError};
use crate::feed::{Aggregator, FeedSource};
use crate::gate::{GateDecision, RateGate};
use crate::generate::{Generator, PromptContext};
use crate::heuristics::Selector;
use crate::remote::{PublishOutcome, PublishRequest, Publisher, Reactor};
use crate::store::cadence::{day_key, unix_seconds};
use crate::store::{Cadence, Relations, StateStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

/// Terminal state of one tick
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Rate gate said no
    Gated(GateDecision),
    PostedOriginal { id: Option<String> },
    /// Original post generated but the platform refused it
    OriginalFailed(PublishOutcome),
    /// Reply committed and sent; `outcome` is what the platform answered
    Replied {
        target: String,
        outcome: PublishOutcome,
    },
    NoAction,
}

impl CycleOutcome {
    pub fn publish_attempted(&self) -> bool {
        matches!(
            self,
            CycleOutcome::PostedOriginal { .. }
                | CycleOutcome::OriginalFailed(_)
                | CycleOutcome::Replied { .. }
        )
    }
}

/// External services the orchestrator drives
#[derive(Clone)]
pub struct Collaborators {
    pub feed: Arc<dyn FeedSource>,
    pub publisher: Arc<dyn Publisher>,
    pub reactor: Arc<dyn Reactor>,
    pub generator: Arc<dyn Generator>,
}

enum ProphetResult {
    NotDue,
    NothingToSay,
    Published(Option<String>),
    PublishFailed(PublishOutcome),
}

pub struct Orchestrator {
    config: Config,
    store: Arc<dyn StateStore>,
    feed: Arc<dyn FeedSource>,
    publisher: Arc<dyn Publisher>,
    reactor: Arc<dyn Reactor>,
    generator: Arc<dyn Generator>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    gate: RateGate,
    selector: Selector,
    aggregator: Aggregator,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        store: Arc<dyn StateStore>,
        collaborators: Collaborators,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match config.agent.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            gate: RateGate::new(&config.cadence),
            selector: Selector::new(&config)?,
            aggregator: Aggregator::new(&config.feed),
            store,
            feed: collaborators.feed,
            publisher: collaborators.publisher,
            reactor: collaborators.reactor,
            generator: collaborators.generator,
            clock: Arc::new(SystemClock),
            rng,
            config,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current rate gate verdict, without side effects.
    pub fn gate_decision(&self) -> Result<GateDecision, StoreError> {
        self.gate.can_post_now(self.store.as_ref(), self.clock.now())
    }

    /// Tick forever until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if let Err(e) = self.ensure_subscriptions().await {
            warn!(error = %e, "Subscription pass failed, continuing");
        }

        let period = Duration::from_secs(self.config.agent.loop_interval_secs);
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = period.as_secs(),
            max_per_day = self.config.cadence.max_posts_per_day,
            original_interval_secs = self.config.prophet.effective_interval_secs(),
            reply_only_if_mentioned = self.config.agent.reply_only_if_mentioned,
            dry_run = self.config.agent.dry_run,
            "Daemon loop started"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                        Ok(Ok(outcome)) => debug!(outcome = ?outcome, "Cycle finished"),
                        Ok(Err(e)) => error!(error = %e, "Cycle aborted"),
                        Err(_) => error!("Cycle panicked"),
                    }
                    info!(secs = period.as_secs(), "Sleeping");
                }
                _ = &mut shutdown => {
                    info!("Stop signal received, shutting down");
                    break;
                }
            }
        }
    }

    /// Execute one tick of the state machine.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        debug!("Cycle starting");

        let decision = self.gate_decision()?;
        if !decision.is_allowed() {
            info!(reason = %decision, "Skipping cycle");
            return Ok(CycleOutcome::Gated(decision));
        }

        match self.try_original_post().await? {
            ProphetResult::Published(id) => return Ok(CycleOutcome::PostedOriginal { id }),
            ProphetResult::PublishFailed(outcome) => {
                return Ok(CycleOutcome::OriginalFailed(outcome))
            }
            ProphetResult::NotDue | ProphetResult::NothingToSay => {}
        }

        self.hunt().await
    }

    async fn try_original_post(&mut self) -> Result<ProphetResult, CycleError> {
        let now = self.clock.now();
        let last = Cadence::new(self.store.as_ref()).last_original_post_time()?;
        if let Some(last) = last {
            let elapsed = unix_seconds(&now) - last;
            if elapsed < self.config.prophet.effective_interval_secs() as f64 {
                debug!(elapsed_secs = elapsed as u64, "Original post not due");
                return Ok(ProphetResult::NotDue);
            }
        }

        let Some(topic) = self.config.prophet.topics.choose(&mut self.rng).cloned() else {
            return Ok(ProphetResult::NotDue);
        };

        let Some(body) = self.generator.generate(PromptContext::original(&topic)).await else {
            info!(topic = %topic, "Nothing to say on topic");
            return Ok(ProphetResult::NothingToSay);
        };

        let request = PublishRequest::original(
            self.config.prophet.title.clone(),
            self.config.prophet.channel.clone(),
            body,
        );
        let outcome = self.send(request).await;

        let PublishOutcome::Published { id } = outcome else {
            warn!(outcome = ?outcome, "Original post not published");
            return Ok(ProphetResult::PublishFailed(outcome));
        };

        let now = self.clock.now();
        let cadence = Cadence::new(self.store.as_ref());
        cadence.set_last_original_post_time(unix_seconds(&now))?;
        let count = cadence.increment_daily_count(&day_key(&now))?;
        cadence.set_last_post_time(unix_seconds(&now))?;
        if let Some(id) = &id {
            Relations::new(self.store.as_ref())
                .record_own_post(id, self.config.store.max_own_posts)?;
        }

        info!(topic = %topic, id = ?id, daily_count = count, "Posted original thought");
        Ok(ProphetResult::Published(id))
    }

    async fn hunt(&mut self) -> Result<CycleOutcome, CycleError> {
        let own_posts: HashSet<String> = Relations::new(self.store.as_ref())
            .own_posts()?
            .into_iter()
            .collect();

        let candidates = self
            .aggregator
            .collect(self.feed.as_ref(), &own_posts, &mut self.rng)
            .await;
        info!(count = candidates.len(), "Fetched candidates");

        let strict = self.config.agent.reply_only_if_mentioned;

        for candidate in &candidates {
            let considered = self.selector.should_consider(
                candidate,
                strict,
                self.store.as_ref(),
                &mut self.rng,
            )?;
            if !considered {
                self.react(candidate).await?;
                continue;
            }

            let inject_lore = self.selector.matches_triggers(&candidate.text());
            let context =
                PromptContext::reply(candidate, inject_lore, self.config.hunter.max_context_chars);

            let Some(reply) = self.generator.generate(context).await else {
                debug!(post_id = %candidate.id, "Generator had nothing to add");
                self.react(candidate).await?;
                continue;
            };

            // Committed before publishing; a failed publish still counts as handled.
            let now = self.clock.now();
            self.store.mark_handled(&candidate.id)?;
            let cadence = Cadence::new(self.store.as_ref());
            let count = cadence.increment_daily_count(&day_key(&now))?;
            cadence.set_last_post_time(unix_seconds(&now))?;

            let request =
                PublishRequest::reply(candidate.id.clone(), candidate.parent_id.clone(), reply);
            let outcome = self.send(request).await;

            match &outcome {
                PublishOutcome::Published { id } => {
                    if let Some(id) = id {
                        Relations::new(self.store.as_ref())
                            .record_own_post(id, self.config.store.max_own_posts)?;
                    }
                    info!(post_id = %candidate.id, daily_count = count, "Posted reply");
                }
                PublishOutcome::RateLimited => {
                    warn!(post_id = %candidate.id, "Reply rate limited by platform")
                }
                PublishOutcome::Failed(reason) => {
                    warn!(post_id = %candidate.id, reason = %reason, "Reply failed")
                }
            }

            return Ok(CycleOutcome::Replied {
                target: candidate.id.clone(),
                outcome,
            });
        }

        info!("No post worth responding to this cycle");
        Ok(CycleOutcome::NoAction)
    }

    /// Publish, or just log the intent in dry-run mode.
    async fn send(&self, request: PublishRequest) -> PublishOutcome {
        if self.config.agent.dry_run {
            info!(
                kind = ?request.kind,
                preview = %preview(&request.body),
                "[dry run] Would publish"
            );
            return PublishOutcome::Published { id: None };
        }
        self.publisher.publish(request).await
    }
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}
