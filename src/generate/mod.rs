//! Text generation boundary.

pub mod gemini;
pub mod prompts;

use async_trait::async_trait;

pub use gemini::GeminiClient;

use crate::feed::Candidate;

/// What the generator is asked to write.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptContext {
    /// Unprompted post inspired by `topic`
    Original { topic: String },
    /// Reply to someone else's post
    Reply {
        title: String,
        body: String,
        inject_lore: bool,
    },
}

impl PromptContext {
    pub fn original(topic: impl Into<String>) -> Self {
        PromptContext::Original {
            topic: topic.into(),
        }
    }

    /// Reply context with the candidate's text cut to `max_chars`.
    pub fn reply(candidate: &Candidate, inject_lore: bool, max_chars: usize) -> Self {
        PromptContext::Reply {
            title: prompts::truncate_chars(candidate.title.trim(), 200),
            body: prompts::truncate_chars(candidate.body.trim(), max_chars),
            inject_lore,
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, PromptContext::Reply { .. })
    }
}

/// `None` means there is nothing worth saying.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, context: PromptContext) -> Option<String>;
}
