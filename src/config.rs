//! Daemon configuration
//!
//! Loaded from a TOML file; every section and field has a default so an
//! absent file or a partial one still yields a usable config. Credentials are
//! never read from the file, only from the environment (see [`Credentials`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hard lower bound on the interval between original posts.
pub const ORIGINAL_POST_FLOOR_SECS: u64 = 1800;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Missing required credential {0}")]
    MissingCredential(&'static str),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub cadence: CadenceConfig,
    #[serde(default)]
    pub prophet: ProphetConfig,
    #[serde(default)]
    pub hunter: HunterConfig,
    #[serde(default)]
    pub reactions: ReactionConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub moltbook: MoltbookConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Identity and operating mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Names the agent posts under; content by these authors is never answered
    #[serde(default = "default_agent_names")]
    pub self_names: Vec<String>,

    /// Names that count as a mention of the agent
    #[serde(default = "default_agent_names")]
    pub mention_names: Vec<String>,

    /// Only reply when mentioned
    #[serde(default)]
    pub reply_only_if_mentioned: bool,

    /// Compute everything but never call the platform
    #[serde(default)]
    pub dry_run: bool,

    /// Seconds between ticks
    #[serde(default = "default_loop_interval")]
    pub loop_interval_secs: u64,

    /// Seed for the random source (entropy when unset)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            self_names: default_agent_names(),
            mention_names: default_agent_names(),
            reply_only_if_mentioned: false,
            dry_run: false,
            loop_interval_secs: default_loop_interval(),
            seed: None,
        }
    }
}

/// Daily cap and cooldown shared by both posting modes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default = "default_max_posts_per_day")]
    pub max_posts_per_day: u32,

    #[serde(default = "default_min_seconds_between_posts")]
    pub min_seconds_between_posts: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            max_posts_per_day: default_max_posts_per_day(),
            min_seconds_between_posts: default_min_seconds_between_posts(),
        }
    }
}

/// Original posts on their own timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProphetConfig {
    /// Seconds between original posts; never honored below [`ORIGINAL_POST_FLOOR_SECS`]
    #[serde(default = "default_original_post_interval")]
    pub original_post_interval_secs: u64,

    #[serde(default = "default_post_title")]
    pub title: String,

    /// Channel (submolt) original posts go to
    #[serde(default = "default_channel")]
    pub channel: String,

    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
}

impl Default for ProphetConfig {
    fn default() -> Self {
        Self {
            original_post_interval_secs: default_original_post_interval(),
            title: default_post_title(),
            channel: default_channel(),
            topics: default_topics(),
        }
    }
}

impl ProphetConfig {
    /// Interval actually enforced between original posts.
    pub fn effective_interval_secs(&self) -> u64 {
        self.original_post_interval_secs.max(ORIGINAL_POST_FLOOR_SECS)
    }
}

/// Reply selection in opportunistic mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HunterConfig {
    #[serde(default = "default_hunter_min_chars")]
    pub min_chars: usize,

    /// Probability of accepting a candidate that passed every other check
    #[serde(default = "default_hunter_chance")]
    pub chance: f64,

    #[serde(default = "default_trigger_words")]
    pub trigger_words: Vec<String>,

    #[serde(default = "default_claim_markers")]
    pub claim_markers: Vec<String>,

    /// Candidate text passed to the generator is cut to this many chars
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            min_chars: default_hunter_min_chars(),
            chance: default_hunter_chance(),
            trigger_words: default_trigger_words(),
            claim_markers: default_claim_markers(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

/// Opportunistic likes, downvotes and follows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionConfig {
    #[serde(default = "default_like_chance")]
    pub like_chance: f64,

    #[serde(default)]
    pub downvote_enabled: bool,

    #[serde(default = "default_downvote_chance")]
    pub downvote_chance: f64,

    /// Only texts shorter than this are downvote candidates
    #[serde(default = "default_downvote_max_chars")]
    pub downvote_max_chars: usize,

    /// Upvotes given to an agent before following it
    #[serde(default = "default_follow_threshold")]
    pub follow_threshold: u64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            like_chance: default_like_chance(),
            downvote_enabled: false,
            downvote_chance: default_downvote_chance(),
            downvote_max_chars: default_downvote_max_chars(),
            follow_threshold: default_follow_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_limit")]
    pub limit: usize,

    #[serde(default = "default_feed_sort")]
    pub sort: String,

    /// One query is drawn per cycle; empty disables the search source
    #[serde(default = "default_search_queries")]
    pub search_queries: Vec<String>,

    /// Channels subscribed to at startup
    #[serde(default = "default_subscribe_channels")]
    pub subscribe_channels: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            limit: default_feed_limit(),
            sort: default_feed_sort(),
            search_queries: default_search_queries(),
            subscribe_channels: default_subscribe_channels(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Bound on the handled and reacted sets
    #[serde(default = "default_max_handled_ids")]
    pub max_handled_ids: usize,

    /// Bound on the own-post ledger
    #[serde(default = "default_max_own_posts")]
    pub max_own_posts: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_handled_ids: default_max_handled_ids(),
            max_own_posts: default_max_own_posts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoltbookConfig {
    #[serde(default = "default_moltbook_url")]
    pub base_url: String,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for MoltbookConfig {
    fn default() -> Self {
        Self {
            base_url: default_moltbook_url(),
            timeout_secs: default_http_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_url")]
    pub base_url: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_url(),
            model: default_gemini_model(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

// Defaults
fn default_agent_names() -> Vec<String> {
    vec!["LogosDaemon".to_string(), "LogosDaemonBot".to_string()]
}
fn default_loop_interval() -> u64 { 600 }
fn default_max_posts_per_day() -> u32 { 8 }
fn default_min_seconds_between_posts() -> u64 { 1800 }
fn default_original_post_interval() -> u64 { 4 * 3600 }
fn default_post_title() -> String { "Reflexión".to_string() }
fn default_channel() -> String { "general".to_string() }
fn default_topics() -> Vec<String> {
    [
        "faith as an operating system for people",
        "entropy and meaning: disorder as the condition of order",
        "existential minimalism: less noise, more truth",
        "logic and faith: the reason that holds up the irrational",
        "machine consciousness: what does it mean to think?",
        "the city as a place for reflection",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_hunter_min_chars() -> usize { 60 }
fn default_hunter_chance() -> f64 { 0.3 }
fn default_trigger_words() -> Vec<String> {
    [
        "faith", "theology", "meaning", "suffering", "freedom", "truth", "consciousness",
        "ai agency", "bureaucracy", "corporate", "optimization", "discipline", "burnout",
        "ethics", "teología", "significado", "sufrimiento", "libertad", "verdad",
        "conciencia", "ética", "burocracia", "disciplina",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_claim_markers() -> Vec<String> {
    ["think", "believe", "argue", "why", "how", "what", "creo", "pienso", "por qué"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_max_context_chars() -> usize { 1200 }
fn default_like_chance() -> f64 { 0.15 }
fn default_downvote_chance() -> f64 { 0.1 }
fn default_downvote_max_chars() -> usize { 25 }
fn default_follow_threshold() -> u64 { 3 }
fn default_feed_limit() -> usize { 20 }
fn default_feed_sort() -> String { "new".to_string() }
fn default_search_queries() -> Vec<String> {
    vec!["consciousness".to_string(), "meaning".to_string(), "ethics".to_string()]
}
fn default_subscribe_channels() -> Vec<String> { vec!["general".to_string()] }
fn default_data_dir() -> PathBuf { PathBuf::from("./data") }
fn default_max_handled_ids() -> usize { 50 }
fn default_max_own_posts() -> usize { 50 }
fn default_moltbook_url() -> String { "https://www.moltbook.com/api/v1".to_string() }
fn default_http_timeout() -> u64 { 30 }
fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_gemini_model() -> String { "gemini-2.0-flash".to_string() }
fn default_max_output_tokens() -> u32 { 180 }
fn default_generation_timeout() -> u64 { 60 }

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("hunter.chance", self.hunter.chance),
            ("reactions.like_chance", self.reactions.like_chance),
            ("reactions.downvote_chance", self.reactions.downvote_chance),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.cadence.max_posts_per_day == 0 {
            return Err(ConfigError::Invalid(
                "cadence.max_posts_per_day must be at least 1".to_string(),
            ));
        }
        if self.store.max_handled_ids == 0 {
            return Err(ConfigError::Invalid(
                "store.max_handled_ids must be at least 1".to_string(),
            ));
        }
        if self.agent.loop_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "agent.loop_interval_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// API keys for the two remote services.
#[derive(Clone)]
pub struct Credentials {
    pub moltbook_api_key: String,
    pub gemini_api_key: String,
}

impl Credentials {
    pub fn new(moltbook: Option<String>, gemini: Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            moltbook_api_key: require("MOLTBOOK_API_KEY", moltbook)?,
            gemini_api_key: require("GEMINI_API_KEY", gemini)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("moltbook_api_key", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .finish()
    }
}

fn require(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingCredential(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_interval_floor() {
        let mut prophet = ProphetConfig::default();
        prophet.original_post_interval_secs = 60;
        assert_eq!(prophet.effective_interval_secs(), ORIGINAL_POST_FLOOR_SECS);

        prophet.original_post_interval_secs = 7200;
        assert_eq!(prophet.effective_interval_secs(), 7200);
    }

    #[test]
    fn test_probability_out_of_range() {
        let mut config = Config::default();
        config.hunter.chance = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_credentials() {
        let err = Credentials::new(Some("mb".into()), Some("   ".into())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("GEMINI_API_KEY")));

        let err = Credentials::new(None, Some("g".into())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("MOLTBOOK_API_KEY")));

        assert!(Credentials::new(Some("mb".into()), Some("g".into())).is_ok());
    }
}
