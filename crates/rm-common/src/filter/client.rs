use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning request failed: {0}")]
    Transport(String),
    #[error("reasoning service returned malformed payload: {0}")]
    Malformed(String),
    #[error("reasoning service not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for ReasoningError {
    fn from(value: reqwest::Error) -> Self {
        ReasoningError::Transport(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    pub enabled: bool,
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_secs: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            api_key: String::new(),
            timeout_secs: 20,
            max_retries: 2,
            retry_backoff_secs: 2,
        }
    }
}

impl ReasoningConfig {
    pub fn from_env() -> Self {
        fn provider_defaults(provider: &str) -> (String, String) {
            match provider.to_ascii_lowercase().as_str() {
                "anthropic" => (
                    "claude-3-5-haiku-latest".into(),
                    "https://api.anthropic.com/v1/messages".into(),
                ),
                "google" | "google-genai" => (
                    "gemini-1.5-flash".into(),
                    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
                        .into(),
                ),
                _ => (
                    "gpt-4o-mini".into(),
                    "https://api.openai.com/v1/chat/completions".into(),
                ),
            }
        }

        fn provider_api_key(provider: &str) -> Option<String> {
            match provider.to_ascii_lowercase().as_str() {
                "openai" => std::env::var("OPENAI_API_KEY").ok(),
                "anthropic" => std::env::var("ANTHROPIC_API_KEY").ok(),
                "google" | "google-genai" => std::env::var("GOOGLE_API_KEY").ok(),
                _ => None,
            }
        }

        fn parse_bool(key: &str, default: bool) -> bool {
            match std::env::var(key) {
                Ok(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
                Err(_) => default,
            }
        }

        fn parse_u64(key: &str, default: u64) -> u64 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(default)
        }

        fn parse_u32(key: &str, default: u32) -> u32 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(default)
        }

        let provider = std::env::var("RM_REASONING_PROVIDER").unwrap_or_else(|_| "openai".into());
        let (default_model, default_endpoint) = provider_defaults(&provider);

        let api_key = std::env::var("RM_REASONING_API_KEY")
            .ok()
            .or_else(|| provider_api_key(&provider))
            .unwrap_or_default();

        Self {
            enabled: parse_bool("RM_REASONING_ENABLED", true),
            provider,
            model: std::env::var("RM_REASONING_MODEL").unwrap_or(default_model),
            endpoint: std::env::var("RM_REASONING_ENDPOINT").unwrap_or(default_endpoint),
            api_key,
            timeout_secs: parse_u64("RM_REASONING_TIMEOUT_SECONDS", 20),
            max_retries: parse_u32("RM_REASONING_MAX_RETRIES", 2),
            retry_backoff_secs: parse_u64("RM_REASONING_RETRY_BACKOFF_SECONDS", 2),
        }
    }
}

/// Minimal seam between the filter and the reasoning transport so tests can
/// substitute deterministic (or failing) backends.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ReasoningError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Chat-completions client with bounded timeout and bounded retries.
pub struct ReasoningClient {
    client: reqwest::Client,
    config: ReasoningConfig,
}

impl ReasoningClient {
    pub fn new(config: ReasoningConfig) -> Result<Self, ReasoningError> {
        if !config.enabled {
            return Err(ReasoningError::NotConfigured(
                "RM_REASONING_ENABLED=0".into(),
            ));
        }
        if config.api_key.trim().is_empty() {
            return Err(ReasoningError::NotConfigured(
                "no reasoning API key set".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ReasoningError::Transport(err.to_string()))?;

        Ok(Self { client, config })
    }

    async fn send_once(&self, prompt: &str) -> Result<String, ReasoningError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&ChatRequest {
                model: &self.config.model,
                messages: [ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                temperature: 0.0,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| ReasoningError::Malformed(err.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ReasoningError::Malformed("no choices in response".into()))
    }
}

#[async_trait]
impl CompletionBackend for ReasoningClient {
    async fn complete(&self, prompt: &str) -> Result<String, ReasoningError> {
        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(self.config.retry_backoff_secs)).await;
            }
            match self.send_once(prompt).await {
                Ok(content) => return Ok(content),
                Err(err) => {
                    warn!(attempt, error = %err, "reasoning request failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ReasoningError::Transport("no attempts made".into())))
    }
}
