//! HTTP client for an OpenAI-compatible chat-completions endpoint.
//!
//! Wraps `POST {api_url}/chat/completions` using [`reqwest`]. Status codes
//! are classified into [`CompletionError`] variants so logs can tell a
//! throttled provider from one that is down.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CompletionConfig;
use crate::error::CompletionError;
use crate::ports::CompletionProvider;

/// Sampling temperature for analysis prompts.
const TEMPERATURE: f32 = 0.3;

/// Completion provider backed by an HTTP API.
pub struct HttpCompletionProvider {
    client: reqwest::Client,
    config: CompletionConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl HttpCompletionProvider {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a provider reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: CompletionConfig) -> Self {
        Self { client, config }
    }

    fn api_key(&self) -> Result<&str, CompletionError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::NotConfigured("COMPLETION_API_KEY is not set".into()))
    }

    /// Map a non-2xx response to an error variant.
    async fn classify_failure(response: reqwest::Response) -> CompletionError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        match status {
            408 | 504 => CompletionError::Timeout,
            429 => CompletionError::Throttled,
            500..=599 => CompletionError::Unavailable(format!("status {status}: {body}")),
            _ => CompletionError::Api { status, body },
        }
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn initialize(&self) -> Result<(), CompletionError> {
        self.api_key()?;
        reqwest::Url::parse(&self.config.api_url).map_err(|e| {
            CompletionError::NotConfigured(format!("invalid COMPLETION_API_URL: {e}"))
        })?;
        if self.config.model.trim().is_empty() {
            return Err(CompletionError::NotConfigured(
                "COMPLETION_MODEL is empty".into(),
            ));
        }
        Ok(())
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": TEMPERATURE,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_url))
            .bearer_auth(self.api_key()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| CompletionError::Malformed("response contained no text".into()))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(api_url: String) -> CompletionConfig {
        CompletionConfig {
            api_url,
            api_key: Some("test-key".to_string()),
            model: "test-model".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_first_choice_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "## Analysis" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpCompletionProvider::new(config(server.uri()));
        let text = provider.complete("analyze").await.unwrap();
        assert_eq!(text, "## Analysis");
    }

    #[tokio::test]
    async fn classifies_throttling_and_outages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let provider = HttpCompletionProvider::new(config(server.uri()));
        assert_matches!(provider.complete("x").await, Err(CompletionError::Throttled));
        assert_matches!(
            provider.complete("x").await,
            Err(CompletionError::Unavailable(msg)) if msg.contains("maintenance")
        );
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let provider = HttpCompletionProvider::new(config(server.uri()));
        assert_matches!(provider.complete("x").await, Err(CompletionError::Malformed(_)));
    }

    #[tokio::test]
    async fn initialize_requires_api_key() {
        let mut cfg = config("http://localhost:1".to_string());
        cfg.api_key = None;
        let provider = HttpCompletionProvider::new(cfg);
        assert_matches!(provider.initialize().await, Err(CompletionError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn initialize_rejects_bad_url() {
        let provider = HttpCompletionProvider::new(config("not a url".to_string()));
        assert_matches!(provider.initialize().await, Err(CompletionError::NotConfigured(_)));
    }
}
