pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::{HttpIndexConfig, HttpVectorIndex};
pub use memory::InMemoryIndex;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },
    #[error("index request failed: {0}")]
    Transport(String),
    #[error("index returned malformed payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for IndexError {
    fn from(value: reqwest::Error) -> Self {
        IndexError::Transport(value.to_string())
    }
}

/// Job attributes stored alongside each vector so the index can filter
/// without a round-trip to the job store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub company: String,
    pub location: String,
    pub industry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexHit {
    pub id: String,
    pub score: f32,
    pub metadata: IndexMetadata,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStats {
    pub count: usize,
    pub dimension: usize,
}

/// Equality/inclusion predicate over indexed job attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Keep hits whose industry is one of these values.
    pub industry_in: Option<Vec<String>>,
    /// Keep hits from exactly this company.
    pub company: Option<String>,
}

impl MetadataFilter {
    pub fn matches(&self, metadata: &IndexMetadata) -> bool {
        if let Some(industries) = &self.industry_in {
            if !industries.iter().any(|i| i == &metadata.industry) {
                return false;
            }
        }
        if let Some(company) = &self.company {
            if company != &metadata.company {
                return false;
            }
        }
        true
    }
}

/// External nearest-neighbor index consumed as a service. The matching
/// pipeline only ever reads from it; the embed worker writes.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: IndexMetadata,
    ) -> Result<(), IndexError>;

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>, IndexError>;

    async fn delete_all(&self) -> Result<(), IndexError>;

    async fn stats(&self) -> Result<IndexStats, IndexError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_on_industry_inclusion() {
        let filter = MetadataFilter {
            industry_in: Some(vec!["software".into(), "fintech".into()]),
            company: None,
        };
        let software = IndexMetadata {
            industry: "software".into(),
            ..IndexMetadata::default()
        };
        let retail = IndexMetadata {
            industry: "retail".into(),
            ..IndexMetadata::default()
        };
        assert!(filter.matches(&software));
        assert!(!filter.matches(&retail));
    }

    #[test]
    fn filter_company_equality_composes_with_industry() {
        let filter = MetadataFilter {
            industry_in: Some(vec!["software".into()]),
            company: Some("Acme".into()),
        };
        let hit = IndexMetadata {
            company: "Acme".into(),
            industry: "software".into(),
            ..IndexMetadata::default()
        };
        let wrong_company = IndexMetadata {
            company: "Beta".into(),
            industry: "software".into(),
            ..IndexMetadata::default()
        };
        assert!(filter.matches(&hit));
        assert!(!filter.matches(&wrong_company));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(MetadataFilter::default().matches(&IndexMetadata::default()));
    }
}
