use std::collections::HashMap;

use tracing::warn;

use crate::index::{IndexError, MetadataFilter, VectorIndex};
use crate::Job;

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Over-fetch multiplier applied to the final result count, leaving the
    /// diversifier room to discard near-duplicates.
    pub overfetch_factor: f64,
    /// Floor on the number of candidates requested from the index.
    pub min_fetch: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: 2.5,
            min_fetch: 50,
        }
    }
}

/// Queries the external index with the résumé vector and maps opaque index
/// ids back onto domain jobs. Ids that fail to resolve are dropped with a
/// warning; partial results are acceptable.
pub struct CandidateRetriever {
    config: RetrieverConfig,
}

impl CandidateRetriever {
    pub fn new(config: RetrieverConfig) -> Self {
        Self { config }
    }

    pub fn default() -> Self {
        Self::new(RetrieverConfig::default())
    }

    pub fn fetch_size(&self, final_k: usize) -> usize {
        let scaled = (final_k as f64 * self.config.overfetch_factor).ceil() as usize;
        scaled.max(self.config.min_fetch)
    }

    pub async fn retrieve(
        &self,
        index: &dyn VectorIndex,
        resume_vector: &[f32],
        final_k: usize,
        corpus: &HashMap<String, Job>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<(Job, f64)>, IndexError> {
        let hits = index
            .query(resume_vector, self.fetch_size(final_k), filter)
            .await?;

        let mut resolved = Vec::with_capacity(hits.len());
        for hit in hits {
            match corpus.get(&hit.id) {
                Some(job) => resolved.push((job.clone(), hit.score as f64)),
                None => {
                    warn!(job_id = %hit.id, "index returned an id not present in the job corpus; dropping");
                }
            }
        }
        Ok(resolved)
    }
}
