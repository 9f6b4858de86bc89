//! Outbound side of the platform: publishing and reactions.

pub mod moltbook;

use async_trait::async_trait;

pub use moltbook::MoltbookClient;

/// Errors from the HTTP adapters. Never escapes a trait call; adapters log
/// these and fall back to an empty or negative result.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Rate limited")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

// The request URL can carry credentials, so it never reaches the message.
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.without_url())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishKind {
    /// New top-level post
    Original { title: String, channel: String },
    /// Comment on `target`; `thread` is the post it hangs under when
    /// `target` is itself a comment
    Reply {
        target: String,
        thread: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub kind: PublishKind,
    pub body: String,
}

impl PublishRequest {
    pub fn original(title: impl Into<String>, channel: impl Into<String>, body: String) -> Self {
        Self {
            kind: PublishKind::Original {
                title: title.into(),
                channel: channel.into(),
            },
            body,
        }
    }

    pub fn reply(target: impl Into<String>, thread: Option<String>, body: String) -> Self {
        Self {
            kind: PublishKind::Reply {
                target: target.into(),
                thread,
            },
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published { id: Option<String> },
    RateLimited,
    Failed(String),
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: PublishRequest) -> PublishOutcome;
}

/// Fire-and-forget reactions. `false` means not applied.
#[async_trait]
pub trait Reactor: Send + Sync {
    async fn like(&self, id: &str) -> bool;
    async fn downvote(&self, id: &str) -> bool;
    async fn follow(&self, agent: &str) -> bool;
    async fn subscribe(&self, channel: &str) -> bool;
}
