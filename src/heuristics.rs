//! Selection heuristics
//!
//! Decide which candidates deserve a reply and which only a reaction.
//! Checks run cheapest first; the random draw comes last so it is only
//! consumed by candidates that passed every deterministic check.

use rand::Rng;
use regex::Regex;

use crate::config::{Config, ConfigError};
use crate::feed::Candidate;
use crate::store::{StateStore, StoreError};

/// Texts longer than this always count as substantial.
const SUBSTANTIAL_CHARS: usize = 80;

/// Opportunistic reaction picked for a candidate that was not replied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Downvote,
}

#[derive(Debug, Clone)]
pub struct Selector {
    mention: Option<Regex>,
    self_names: Vec<String>,
    trigger_words: Vec<String>,
    claim_markers: Vec<String>,
    min_chars: usize,
    chance: f64,
    like_chance: f64,
    downvote_enabled: bool,
    downvote_chance: f64,
    downvote_max_chars: usize,
}

impl Selector {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            mention: mention_pattern(&config.agent.mention_names)?,
            self_names: config.agent.self_names.clone(),
            trigger_words: lowercase_all(&config.hunter.trigger_words),
            claim_markers: lowercase_all(&config.hunter.claim_markers),
            min_chars: config.hunter.min_chars,
            chance: config.hunter.chance,
            like_chance: config.reactions.like_chance,
            downvote_enabled: config.reactions.downvote_enabled,
            downvote_chance: config.reactions.downvote_chance,
            downvote_max_chars: config.reactions.downvote_max_chars,
        })
    }

    /// Whether to spend a generation call on `candidate`.
    pub fn should_consider<R: Rng + ?Sized>(
        &self,
        candidate: &Candidate,
        strict_mention_only: bool,
        store: &dyn StateStore,
        rng: &mut R,
    ) -> Result<bool, StoreError> {
        if store.is_handled(&candidate.id)? {
            return Ok(false);
        }
        if candidate.is_authored_by(&self.self_names) {
            return Ok(false);
        }

        let text = candidate.text();
        if self.is_mentioned(&text) {
            return Ok(true);
        }
        if strict_mention_only {
            return Ok(false);
        }

        if !self.matches_triggers(&text) {
            return Ok(false);
        }
        if text.chars().count() < self.min_chars {
            return Ok(false);
        }
        if !self.is_substantial(&text) {
            return Ok(false);
        }

        Ok(rng.gen::<f64>() < self.chance)
    }

    /// Case-insensitive, word-bounded match on any mention name, `@` optional.
    pub fn is_mentioned(&self, text: &str) -> bool {
        self.mention
            .as_ref()
            .map(|pattern| pattern.is_match(text))
            .unwrap_or(false)
    }

    pub fn matches_triggers(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.trigger_words.iter().any(|word| lower.contains(word))
    }

    /// A question, a claim/inquiry marker, or simply long.
    pub fn is_substantial(&self, text: &str) -> bool {
        let text = text.trim();
        if text.ends_with('?') {
            return true;
        }
        let lower = text.to_lowercase();
        if self.claim_markers.iter().any(|marker| lower.contains(marker)) {
            return true;
        }
        text.chars().count() > SUBSTANTIAL_CHARS
    }

    /// Pick at most one reaction for a candidate that got no reply.
    pub fn reaction_for<R: Rng + ?Sized>(
        &self,
        candidate: &Candidate,
        store: &dyn StateStore,
        rng: &mut R,
    ) -> Result<Option<Reaction>, StoreError> {
        let text = candidate.text();
        if !self.matches_triggers(&text) || candidate.is_authored_by(&self.self_names) {
            return Ok(None);
        }
        if store.is_handled(&candidate.id)? || store.is_reacted(&candidate.id)? {
            return Ok(None);
        }

        if rng.gen::<f64>() < self.like_chance {
            return Ok(Some(Reaction::Like));
        }

        if self.downvote_enabled
            && text.chars().count() < self.downvote_max_chars
            && rng.gen::<f64>() < self.downvote_chance
        {
            return Ok(Some(Reaction::Downvote));
        }

        Ok(None)
    }
}

fn mention_pattern(names: &[String]) -> Result<Option<Regex>, ConfigError> {
    let alternatives: Vec<String> = names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"(?i)@?\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| ConfigError::Invalid(format!("mention names: {}", e)))
}

fn lowercase_all(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}
