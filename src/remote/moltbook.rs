//! Moltbook REST client.
//!
//! Implements [`FeedSource`], [`Publisher`] and [`Reactor`] over the public
//! JSON API. Every failure is logged here and turned into an empty or
//! negative result; nothing propagates into the cycle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::{ClientError, PublishKind, PublishOutcome, PublishRequest, Publisher, Reactor};
use crate::feed::{Author, Candidate, FeedKind, FeedSource};

pub struct MoltbookClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MoltbookClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;
        read_json(response).await
    }

    async fn post_json(&self, path: &str, payload: Option<Value>) -> Result<Value, ClientError> {
        let mut request = self.client.post(self.url(path)).bearer_auth(&self.api_key);
        if let Some(payload) = payload {
            request = request.json(&payload);
        }
        read_json(request.send().await?).await
    }

    async fn fire(&self, what: &str, path: String) -> bool {
        match self.post_json(&path, None).await {
            Ok(_) => {
                debug!(what, path = %path, "Reaction applied");
                true
            }
            Err(e) => {
                warn!(what, path = %path, error = %e, "Reaction not applied");
                false
            }
        }
    }
}

async fn read_json(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ClientError::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Post list under whichever envelope the endpoint uses.
fn post_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => ["posts", "data", "results", "comments"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn candidate_from(value: &Value) -> Option<Candidate> {
    let id = string_field(value, "id")?;
    let author = ["author", "agent"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find(|a| !a.is_null())
        .and_then(|a| serde_json::from_value::<Author>(a.clone()).ok());

    Some(Candidate {
        id,
        title: string_field(value, "title").unwrap_or_default(),
        body: string_field(value, "content").unwrap_or_default(),
        author,
        parent_id: string_field(value, "parent_id").or_else(|| string_field(value, "post_id")),
    })
}

/// Identity of a freshly created post or comment.
fn created_id(body: &Value) -> Option<String> {
    ["post", "comment", "data"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|inner| string_field(inner, "id")))
        .or_else(|| string_field(body, "id"))
}

#[async_trait]
impl FeedSource for MoltbookClient {
    async fn fetch(&self, limit: usize, sort: &str, kind: FeedKind) -> Vec<Candidate> {
        let (path, mut query) = match &kind {
            FeedKind::Personalized => ("/feed", vec![]),
            FeedKind::Global => ("/posts", vec![]),
            FeedKind::Search(q) => ("/search", vec![("q", q.clone()), ("type", "posts".to_string())]),
        };
        query.push(("sort", sort.to_string()));
        query.push(("limit", limit.to_string()));

        match self.get_json(path, &query).await {
            Ok(body) => {
                let candidates: Vec<Candidate> =
                    post_list(body).iter().filter_map(candidate_from).collect();
                debug!(kind = ?kind, count = candidates.len(), "Fetched feed");
                candidates
            }
            Err(e) => {
                error!(kind = ?kind, error = %e, "Feed fetch failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Publisher for MoltbookClient {
    async fn publish(&self, request: PublishRequest) -> PublishOutcome {
        let (path, payload) = match &request.kind {
            PublishKind::Original { title, channel } => (
                "/posts".to_string(),
                json!({ "submolt": channel, "title": title, "content": request.body }),
            ),
            PublishKind::Reply { target, thread: None } => (
                format!("/posts/{}/comments", target),
                json!({ "content": request.body }),
            ),
            PublishKind::Reply {
                target,
                thread: Some(thread),
            } => (
                format!("/posts/{}/comments", thread),
                json!({ "content": request.body, "parent_id": target }),
            ),
        };

        match self.post_json(&path, Some(payload)).await {
            Ok(body) => {
                let id = created_id(&body);
                info!(path = %path, id = ?id, "Published");
                PublishOutcome::Published { id }
            }
            Err(ClientError::RateLimited) => {
                warn!(path = %path, "Publish rate limited");
                PublishOutcome::RateLimited
            }
            Err(e) => {
                error!(path = %path, error = %e, "Publish failed");
                PublishOutcome::Failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl Reactor for MoltbookClient {
    async fn like(&self, id: &str) -> bool {
        self.fire("like", format!("/posts/{}/upvote", id)).await
    }

    async fn downvote(&self, id: &str) -> bool {
        self.fire("downvote", format!("/posts/{}/downvote", id)).await
    }

    async fn follow(&self, agent: &str) -> bool {
        self.fire("follow", format!("/agents/{}/follow", agent)).await
    }

    async fn subscribe(&self, channel: &str) -> bool {
        self.fire("subscribe", format!("/submolts/{}/subscribe", channel))
            .await
    }
}
