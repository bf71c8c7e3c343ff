pub mod hash;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Transport(String),
    #[error("embedding provider returned malformed payload: {0}")]
    Malformed(String),
    #[error("embedding provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for EmbedError {
    fn from(value: reqwest::Error) -> Self {
        EmbedError::Transport(value.to_string())
    }
}

/// Immutable embedding configuration, constructed once at startup and passed
/// into provider constructors. The vocabulary lists terms so common in job
/// text that the hash embedder halves their weight, a cheap stand-in for a
/// document-frequency signal.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub dimension: usize,
    pub model: String,
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub vocabulary: Vec<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 1536,
            model: "text-embedding-3-small".into(),
            endpoint: "https://api.openai.com/v1/embeddings".into(),
            api_key: String::new(),
            timeout_secs: 15,
            vocabulary: default_vocabulary(),
        }
    }
}

fn default_vocabulary() -> Vec<String> {
    [
        "engineer",
        "developer",
        "software",
        "senior",
        "junior",
        "experience",
        "skills",
        "team",
        "development",
        "remote",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Reads `RM_EMBED_*` settings; the API key falls back to `OPENAI_API_KEY`.
pub fn load_config_from_env() -> EmbeddingConfig {
    let defaults = EmbeddingConfig::default();
    EmbeddingConfig {
        dimension: std::env::var("RM_EMBED_DIMENSION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.dimension),
        model: std::env::var("RM_EMBED_MODEL").unwrap_or(defaults.model),
        endpoint: std::env::var("RM_EMBED_ENDPOINT").unwrap_or(defaults.endpoint),
        api_key: std::env::var("RM_EMBED_API_KEY")
            .ok()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default(),
        timeout_secs: std::env::var("RM_EMBED_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.timeout_secs),
        vocabulary: defaults.vocabulary,
    }
}

/// External embedding model consumed as a service.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Default implementation loops; providers with a native batch endpoint
    /// should override. Failures stay per-item so a bad input cannot sink
    /// the batch.
    async fn embed_batch(&self, texts: &[String]) -> Vec<Result<Vec<f32>, EmbedError>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await);
        }
        out
    }
}

/// Provider factory. Unknown names and misconfigured providers fall back to
/// the deterministic hash embedder so the system keeps producing vectors.
pub fn create_provider(name: &str, config: EmbeddingConfig) -> Box<dyn EmbeddingProvider> {
    match name {
        "openai" => match OpenAiEmbedder::new(config.clone()) {
            Ok(provider) => Box::new(provider),
            Err(err) => {
                warn!(error = %err, "openai embedder unavailable; falling back to hash embedder");
                Box::new(HashEmbedder::new(config))
            }
        },
        "hash" => Box::new(HashEmbedder::new(config)),
        other => {
            warn!(provider = other, "unknown embedding provider; using hash embedder");
            Box::new(HashEmbedder::new(config))
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: Duration::from_millis(500),
        }
    }
}

/// Embed `(id, text)` pairs in fixed-size batches with a pause between
/// batches to respect provider quotas. A failed item is logged and skipped;
/// the run always completes.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    items: &[(String, String)],
    config: &BatchConfig,
) -> Vec<(String, Vec<f32>)> {
    let batch_size = config.batch_size.max(1);
    let mut embedded = Vec::with_capacity(items.len());

    for (batch_idx, chunk) in items.chunks(batch_size).enumerate() {
        if batch_idx > 0 && !config.batch_delay.is_zero() {
            tokio::time::sleep(config.batch_delay).await;
        }

        let texts: Vec<String> = chunk.iter().map(|(_, text)| text.clone()).collect();
        let results = provider.embed_batch(&texts).await;

        for ((id, _), result) in chunk.iter().zip(results) {
            match result {
                Ok(vector) => embedded.push((id.clone(), vector)),
                Err(err) => {
                    warn!(id = %id, error = %err, "embedding failed; skipping item");
                }
            }
        }
    }

    info!(
        requested = items.len(),
        embedded = embedded.len(),
        "batch embedding finished"
    );
    embedded
}
