//! Gemini `generateContent` backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::prompts::{build_prompt, clean_response};
use super::{Generator, PromptContext};
use crate::config::GeminiConfig;
use crate::remote::ClientError;

const REPLY_TEMPERATURE: f32 = 0.7;
const ORIGINAL_TEMPERATURE: f32 = 0.8;
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<Content>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, api_key: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            max_output_tokens: config.max_output_tokens,
        })
    }

    async fn complete(&self, prompt: String, temperature: f32) -> Result<String, ClientError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
                temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

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

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        Ok(text)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, context: PromptContext) -> Option<String> {
        let temperature = if context.is_reply() {
            REPLY_TEMPERATURE
        } else {
            ORIGINAL_TEMPERATURE
        };

        match self.complete(build_prompt(&context), temperature).await {
            Ok(raw) => {
                let cleaned = clean_response(&raw, context.is_reply());
                debug!(
                    reply = context.is_reply(),
                    produced = cleaned.is_some(),
                    "Generation finished"
                );
                cleaned
            }
            Err(ClientError::RateLimited) => {
                warn!("Generator rate limited");
                None
            }
            Err(e) => {
                error!(error = %e, "Generation failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_timeout_error_does_not_leak_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = GeminiConfig {
            base_url: server.uri(),
            timeout_secs: 1,
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(&config, "SECRET-GEMINI-KEY").unwrap();

        let err = client
            .complete("hello".to_string(), REPLY_TEMPERATURE)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Network(_)));
        assert!(!err.to_string().contains("SECRET-GEMINI-KEY"));
        assert!(!format!("{:?}", err).contains("SECRET-GEMINI-KEY"));
    }
}
