//! Candidates and the feed sources they come from.

pub mod aggregator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use aggregator::Aggregator;

/// Author field as the platform sends it: a bare name or a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    PlainName(String),
    Record {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        id: Option<String>,
    },
}

impl Author {
    /// Normalized author name; `None` when missing or blank.
    pub fn name(&self) -> Option<&str> {
        let raw = match self {
            Author::PlainName(name) => Some(name.as_str()),
            Author::Record { name, .. } => name.as_deref(),
        };
        raw.map(str::trim).filter(|name| !name.is_empty())
    }
}

/// A piece of remote content considered during one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: Option<Author>,
    /// Identity of the post this one replies to
    pub parent_id: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().and_then(Author::name)
    }

    /// True when the author resolves to one of `names`. Unresolved authors are never self.
    pub fn is_authored_by(&self, names: &[String]) -> bool {
        match self.author_name() {
            Some(author) => names.iter().any(|name| name.trim() == author),
            None => false,
        }
    }

    /// Title and body joined, as seen by the heuristics.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.body).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
    /// Subscriptions and follows
    Personalized,
    /// Everything on the platform
    Global,
    Search(String),
}

/// Source of candidates. Failures come back as an empty list.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, limit: usize, sort: &str, kind: FeedKind) -> Vec<Candidate>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["LogosDaemon".to_string(), "LogosDaemonBot".to_string()]
    }

    #[test]
    fn test_author_shapes_deserialize() {
        let plain: Author = serde_json::from_str(r#""LogosDaemon""#).unwrap();
        assert_eq!(plain.name(), Some("LogosDaemon"));

        let record: Author =
            serde_json::from_str(r#"{"name": " LogosDaemon ", "id": "ag_1", "karma": 4}"#).unwrap();
        assert_eq!(record.name(), Some("LogosDaemon"));

        let nameless: Author = serde_json::from_str(r#"{"id": "ag_2"}"#).unwrap();
        assert_eq!(nameless.name(), None);
    }

    #[test]
    fn test_self_detection() {
        let own = Candidate::new("p1").with_author(Author::PlainName("LogosDaemonBot".into()));
        assert!(own.is_authored_by(&names()));

        let other = Candidate::new("p2").with_author(Author::Record {
            name: Some("Sophia".into()),
            id: None,
        });
        assert!(!other.is_authored_by(&names()));

        let anonymous = Candidate::new("p3");
        assert!(!anonymous.is_authored_by(&names()));

        let blank = Candidate::new("p4").with_author(Author::PlainName("  ".into()));
        assert!(!blank.is_authored_by(&names()));
    }

    #[test]
    fn test_text_joins_title_and_body() {
        let c = Candidate::new("p1").with_title("On truth").with_body("is it relative?");
        assert_eq!(c.text(), "On truth is it relative?");

        let untitled = Candidate::new("p2").with_body("just a body");
        assert_eq!(untitled.text(), "just a body");
    }
}
