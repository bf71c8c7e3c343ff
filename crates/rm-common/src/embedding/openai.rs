use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{EmbedError, EmbeddingConfig, EmbeddingProvider};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Hosted embedding model behind an OpenAI-compatible `/v1/embeddings`
/// endpoint. Construction fails without an API key so callers can fall back
/// to the hash embedder instead of failing at request time.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbedError> {
        if config.api_key.trim().is_empty() {
            return Err(EmbedError::NotConfigured(
                "no embedding API key set (RM_EMBED_API_KEY / OPENAI_API_KEY)".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| EmbedError::Transport(err.to_string()))?;

        Ok(Self { client, config })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| EmbedError::Malformed(err.to_string()))?;

        if body.data.len() != input.len() {
            return Err(EmbedError::Malformed(format!(
                "expected {} embeddings, got {}",
                input.len(),
                body.data.len()
            )));
        }

        let vectors: Vec<Vec<f32>> = body.data.into_iter().map(|d| d.embedding).collect();
        for vector in &vectors {
            if vector.len() != self.config.dimension {
                return Err(EmbedError::Malformed(format!(
                    "expected dimension {}, got {}",
                    self.config.dimension,
                    vector.len()
                )));
            }
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbedError::Malformed("empty embedding response".into()))
    }

    /// The embeddings endpoint accepts the whole batch in one call; a
    /// transport failure is fanned out to every item so callers can skip
    /// and continue.
    async fn embed_batch(&self, texts: &[String]) -> Vec<Result<Vec<f32>, EmbedError>> {
        match self.request(texts).await {
            Ok(vectors) => vectors.into_iter().map(Ok).collect(),
            Err(err) => texts
                .iter()
                .map(|_| Err(EmbedError::Transport(err.to_string())))
                .collect(),
        }
    }
}
