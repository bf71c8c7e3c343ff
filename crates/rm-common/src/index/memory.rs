use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{IndexError, IndexHit, IndexMetadata, IndexStats, MetadataFilter, VectorIndex};
use crate::matching::similarity::cosine_similarity;

/// Exact-scan in-process index. Serves as the deterministic test double and
/// as the degraded-mode index when no external service is configured.
pub struct InMemoryIndex {
    dimension: usize,
    entries: RwLock<HashMap<String, (Vec<f32>, IndexMetadata)>>,
}

impl InMemoryIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::Dimension {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: IndexMetadata,
    ) -> Result<(), IndexError> {
        self.check_dimension(vector)?;
        let mut entries = self.entries.write().expect("index lock poisoned");
        entries.insert(id.to_string(), (vector.to_vec(), metadata));
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>, IndexError> {
        self.check_dimension(vector)?;
        let entries = self.entries.read().expect("index lock poisoned");

        let mut hits: Vec<IndexHit> = entries
            .iter()
            .filter(|(_, (_, metadata))| filter.map_or(true, |f| f.matches(metadata)))
            .map(|(id, (stored, metadata))| {
                let score = cosine_similarity(vector, stored)
                    .map(|s| s as f32)
                    .unwrap_or(0.0);
                IndexHit {
                    id: id.clone(),
                    score,
                    metadata: metadata.clone(),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn delete_all(&self) -> Result<(), IndexError> {
        self.entries.write().expect("index lock poisoned").clear();
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, IndexError> {
        let entries = self.entries.read().expect("index lock poisoned");
        Ok(IndexStats {
            count: entries.len(),
            dimension: self.dimension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(company: &str, industry: &str) -> IndexMetadata {
        IndexMetadata {
            company: company.into(),
            location: "Berlin".into(),
            industry: industry.into(),
        }
    }

    #[tokio::test]
    async fn query_returns_nearest_first() {
        let index = InMemoryIndex::new(2);
        index
            .upsert("near", &[1.0, 0.0], meta("Acme", "software"))
            .await
            .unwrap();
        index
            .upsert("far", &[0.0, 1.0], meta("Beta", "software"))
            .await
            .unwrap();

        let hits = index.query(&[1.0, 0.1], 10, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "near");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn query_respects_top_k_and_filter() {
        let index = InMemoryIndex::new(2);
        for (id, industry) in [("a", "software"), ("b", "retail"), ("c", "software")] {
            index
                .upsert(id, &[1.0, 0.0], meta("Acme", industry))
                .await
                .unwrap();
        }

        let filter = MetadataFilter {
            industry_in: Some(vec!["software".into()]),
            company: None,
        };
        let hits = index.query(&[1.0, 0.0], 1, Some(&filter)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.industry, "software");
    }

    #[tokio::test]
    async fn upsert_replaces_existing_vector() {
        let index = InMemoryIndex::new(2);
        index
            .upsert("a", &[1.0, 0.0], meta("Acme", "software"))
            .await
            .unwrap();
        index
            .upsert("a", &[0.0, 1.0], meta("Acme", "software"))
            .await
            .unwrap();

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.count, 1);

        let hits = index.query(&[0.0, 1.0], 1, None).await.unwrap();
        assert!(hits[0].score > 0.99);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let index = InMemoryIndex::new(3);
        let err = index
            .upsert("a", &[1.0, 0.0], meta("Acme", "software"))
            .await
            .unwrap_err();
        match err {
            IndexError::Dimension {
                expected: 3,
                got: 2,
            } => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_all_empties_the_index() {
        let index = InMemoryIndex::new(2);
        index
            .upsert("a", &[1.0, 0.0], meta("Acme", "software"))
            .await
            .unwrap();
        index.delete_all().await.unwrap();
        assert_eq!(index.stats().await.unwrap().count, 0);
    }
}
