use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{IndexError, IndexHit, IndexMetadata, IndexStats, MetadataFilter, VectorIndex};

#[derive(Debug, Clone)]
pub struct HttpIndexConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl HttpIndexConfig {
    /// Reads `RM_INDEX_URL` / `RM_INDEX_API_KEY` / `RM_INDEX_TIMEOUT_SECONDS`.
    /// Returns `None` when no index URL is configured, which callers treat
    /// as "run with the in-process index".
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("RM_INDEX_URL").ok()?;
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("RM_INDEX_API_KEY").ok(),
            timeout_secs: std::env::var("RM_INDEX_TIMEOUT_SECONDS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(10),
        })
    }
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    id: &'a str,
    vector: &'a [f32],
    metadata: &'a IndexMetadata,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a MetadataFilter>,
}

#[derive(Deserialize)]
struct QueryResponse {
    hits: Vec<IndexHit>,
}

/// JSON client for the external nearest-neighbor service. Every call
/// carries the configured timeout; transport and decode failures surface as
/// `IndexError` and are absorbed by the pipeline's fallback path.
pub struct HttpVectorIndex {
    client: reqwest::Client,
    config: HttpIndexConfig,
}

impl HttpVectorIndex {
    pub fn new(config: HttpIndexConfig) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| IndexError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.config.base_url);
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("x-api-key", key);
        }
        builder
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    #[instrument(skip(self, vector, metadata), fields(id = %id))]
    async fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: IndexMetadata,
    ) -> Result<(), IndexError> {
        self.request(reqwest::Method::POST, "/vectors/upsert")
            .json(&UpsertRequest {
                id,
                vector,
                metadata: &metadata,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    #[instrument(skip(self, vector, filter))]
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        let response = self
            .request(reqwest::Method::POST, "/vectors/query")
            .json(&QueryRequest {
                vector,
                top_k,
                filter,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|err| IndexError::Malformed(err.to_string()))?;
        Ok(body.hits)
    }

    async fn delete_all(&self) -> Result<(), IndexError> {
        self.request(reqwest::Method::POST, "/vectors/delete_all")
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, IndexError> {
        let response = self
            .request(reqwest::Method::GET, "/vectors/stats")
            .send()
            .await?
            .error_for_status()?;
        response
            .json()
            .await
            .map_err(|err| IndexError::Malformed(err.to_string()))
    }
}
