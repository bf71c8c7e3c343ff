use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use strum::AsRefStr;
use tracing::{info, instrument, warn};

use super::{
    diversify::{diversify, MmrConfig},
    retrieve::{CandidateRetriever, RetrieverConfig},
    scoring::{MatchResult, MatchScorer, MatchingConfig},
};
use crate::db::{JobMatchInsert, MatchStore};
use crate::embedding::EmbeddingProvider;
use crate::error::MatchError;
use crate::filter::AppropriatenessFilter;
use crate::index::VectorIndex;
use crate::{run_id, Job, Resume};

pub const ENGINE_VERSION: &str = concat!("rm-engine/", env!("CARGO_PKG_VERSION"));

/// Linear pipeline stages, used for structured logging. `Failed` marks the
/// hand-off to a degraded path rather than a user-visible outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
enum Stage {
    Retrieving,
    Scoring,
    Diversifying,
    Filtering,
    Persisting,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub scoring: MatchingConfig,
    pub retriever: RetrieverConfig,
    pub mmr_lambda: f64,
    pub max_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scoring: MatchingConfig::default(),
            retriever: RetrieverConfig::default(),
            mmr_lambda: 0.7,
            max_limit: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchStats {
    pub total_jobs: usize,
    pub matches_found: usize,
    pub avg_match_score: f64,
    pub processing_time_ms: u64,
}

#[derive(Debug)]
pub struct MatchOutcome {
    pub matches: Vec<MatchResult>,
    pub stats: MatchStats,
}

/// Sequences retrieval, scoring, diversification, appropriateness
/// filtering, and persistence for one résumé. External collaborators come
/// in as trait objects so the deterministic core is testable in-process.
pub struct MatchingService {
    store: Arc<dyn MatchStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    filter: Arc<dyn AppropriatenessFilter>,
    scorer: MatchScorer,
    retriever: CandidateRetriever,
    config: PipelineConfig,
}

impl MatchingService {
    pub fn new(
        store: Arc<dyn MatchStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        filter: Arc<dyn AppropriatenessFilter>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            filter,
            scorer: MatchScorer::new(config.scoring.clone()),
            retriever: CandidateRetriever::new(config.retriever.clone()),
            config,
        }
    }

    /// Run the full pipeline for one résumé and return at most `limit`
    /// matches plus run statistics. Degrades to an in-process corpus scan
    /// when retrieval is unavailable; the caller always gets the best list
    /// the system could produce.
    #[instrument(skip(self), fields(resume_id = %resume_id))]
    pub async fn find_matches(
        &self,
        resume_id: &str,
        limit: usize,
    ) -> Result<MatchOutcome, MatchError> {
        let started = Instant::now();
        let limit = limit.clamp(1, self.config.max_limit);

        let resume = self
            .store
            .get_resume(resume_id)
            .await
            .map_err(|err| MatchError::ServiceUnavailable(err.to_string()))?
            .ok_or_else(|| MatchError::InvalidInput(format!("resume {resume_id} not found")))?;
        resume.validate()?;

        let jobs = self
            .store
            .all_jobs()
            .await
            .map_err(|err| MatchError::ServiceUnavailable(err.to_string()))?;
        let total_jobs = jobs.len();

        let matches = match self.retrieve_candidates(&resume, limit, &jobs).await {
            Ok(candidates) => {
                let ranked = self.score_candidates(&candidates, &resume);

                info!(
                    stage = Stage::Diversifying.as_ref(),
                    pool = ranked.len(),
                    "diversifying ranked candidates"
                );
                let diversified = diversify(
                    ranked,
                    &MmrConfig {
                        lambda: self.config.mmr_lambda,
                        max_results: limit,
                    },
                );

                info!(
                    stage = Stage::Filtering.as_ref(),
                    filter = self.filter.name(),
                    candidates = diversified.len(),
                    "applying appropriateness filter"
                );
                let outcome = self
                    .filter
                    .filter(&resume.profile, diversified, limit)
                    .await;
                for rejected in &outcome.rejected {
                    info!(
                        job_id = %rejected.result.job.id,
                        reason = %rejected.reason,
                        "candidate filtered out"
                    );
                }
                outcome.kept
            }
            Err(err) => {
                warn!(
                    stage = Stage::Failed.as_ref(),
                    error = %err,
                    "retrieval unavailable; scoring full local corpus instead"
                );
                let mut ranked = self.score_candidates(&jobs, &resume);
                ranked.truncate(limit);
                ranked
            }
        };

        self.persist_matches(&resume, &matches).await;

        let stats = MatchStats {
            total_jobs,
            matches_found: matches.len(),
            avg_match_score: average_score(&matches),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            stage = Stage::Done.as_ref(),
            matches = stats.matches_found,
            total_jobs = stats.total_jobs,
            avg_score = stats.avg_match_score,
            elapsed_ms = stats.processing_time_ms,
            "matching finished"
        );

        Ok(MatchOutcome { matches, stats })
    }

    /// Resolve the résumé vector and ask the index for an over-fetched
    /// candidate pool. Any failure here (no vector, embed failure, index
    /// failure, empty index) sends the pipeline down the local-scan path.
    async fn retrieve_candidates(
        &self,
        resume: &Resume,
        limit: usize,
        jobs: &[Job],
    ) -> Result<Vec<Job>, MatchError> {
        let vector = match &resume.embedding {
            Some(vector) => vector.clone(),
            None => match &self.embedder {
                Some(embedder) => embedder.embed(&resume.raw_text).await?,
                None => {
                    return Err(MatchError::ServiceUnavailable(
                        "resume has no embedding and no provider is configured".into(),
                    ));
                }
            },
        };

        let corpus: HashMap<String, Job> =
            jobs.iter().map(|job| (job.id.clone(), job.clone())).collect();

        info!(
            stage = Stage::Retrieving.as_ref(),
            fetch = self.retriever.fetch_size(limit),
            "querying vector index"
        );
        let candidates = self
            .retriever
            .retrieve(self.index.as_ref(), &vector, limit, &corpus, None)
            .await?;

        if candidates.is_empty() {
            return Err(MatchError::ServiceUnavailable(
                "vector index returned no resolvable candidates".into(),
            ));
        }

        Ok(candidates.into_iter().map(|(job, _)| job).collect())
    }

    /// Composite-score a candidate pool and rank by score. A malformed job
    /// record is logged and skipped; the résumé itself was validated before
    /// this point.
    fn score_candidates(&self, candidates: &[Job], resume: &Resume) -> Vec<MatchResult> {
        info!(
            stage = Stage::Scoring.as_ref(),
            candidates = candidates.len(),
            "scoring candidates"
        );

        let mut ranked: Vec<MatchResult> = candidates
            .iter()
            .filter_map(|job| match self.scorer.score(job, resume) {
                Ok(result) => Some(result),
                Err(err) => {
                    warn!(job_id = %job.id, error = %err, "skipping unscorable job");
                    None
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Append one audit record per returned match. Failures are logged and
    /// never invalidate the computed results.
    async fn persist_matches(&self, resume: &Resume, matches: &[MatchResult]) {
        info!(
            stage = Stage::Persisting.as_ref(),
            records = matches.len(),
            "persisting match records"
        );

        for result in matches {
            let record = JobMatchInsert {
                resume_id: resume.id.clone(),
                job_id: result.job.id.clone(),
                score: result.score,
                confidence: result.confidence,
                matching_skills: result.matching_skills.clone(),
                explanation: result.explanation.clone(),
                match_run_id: run_id::get().to_string(),
                engine_version: Some(ENGINE_VERSION.to_string()),
            };
            if let Err(err) = self.store.insert_match(&record).await {
                warn!(
                    job_id = %result.job.id,
                    error = %err,
                    "failed to persist match record"
                );
            }
        }
    }
}

fn average_score(matches: &[MatchResult]) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }
    let sum: f64 = matches.iter().map(|m| m.score).sum();
    let avg = sum / matches.len() as f64;
    (avg * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StoreError};
    use crate::filter::KeepAllFilter;
    use crate::index::{
        IndexError, IndexHit, IndexMetadata, IndexStats, InMemoryIndex, MetadataFilter,
        VectorIndex,
    };
    use crate::{ExperienceTier, ResumeProfile};
    use async_trait::async_trait;

    fn job(id: &str, company: &str, skills: &[&str], tier: ExperienceTier) -> Job {
        Job {
            id: id.into(),
            title: "Engineer".into(),
            company: company.into(),
            location: "Berlin".into(),
            industry: "software".into(),
            experience_tier: tier,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Job::default()
        }
    }

    fn resume() -> Resume {
        Resume {
            id: "r1".into(),
            raw_text: "react and node engineer".into(),
            profile: ResumeProfile {
                skills: vec!["react".into(), "node.js".into(), "aws".into()],
                primary_role: "Full-Stack Engineer".into(),
                industries: vec!["software".into()],
                experience_tier: ExperienceTier::Mid,
                years_experience: 4.0,
            },
            embedding: None,
        }
    }

    fn service(store: Arc<MemoryStore>, index: Arc<dyn VectorIndex>) -> MatchingService {
        MatchingService::new(
            store,
            index,
            None,
            Arc::new(KeepAllFilter),
            PipelineConfig::default(),
        )
    }

    struct FailingIndex;

    #[async_trait]
    impl VectorIndex for FailingIndex {
        async fn upsert(
            &self,
            _id: &str,
            _vector: &[f32],
            _metadata: IndexMetadata,
        ) -> Result<(), IndexError> {
            Err(IndexError::Transport("down".into()))
        }

        async fn query(
            &self,
            _vector: &[f32],
            _top_k: usize,
            _filter: Option<&MetadataFilter>,
        ) -> Result<Vec<IndexHit>, IndexError> {
            Err(IndexError::Transport("down".into()))
        }

        async fn delete_all(&self) -> Result<(), IndexError> {
            Err(IndexError::Transport("down".into()))
        }

        async fn stats(&self) -> Result<IndexStats, IndexError> {
            Err(IndexError::Transport("down".into()))
        }
    }

    struct FailingInsertStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl MatchStore for FailingInsertStore {
        async fn get_resume(&self, id: &str) -> Result<Option<Resume>, StoreError> {
            self.inner.get_resume(id).await
        }

        async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
            self.inner.get_job(id).await
        }

        async fn all_jobs(&self) -> Result<Vec<Job>, StoreError> {
            self.inner.all_jobs().await
        }

        async fn jobs_missing_embedding(&self, limit: i64) -> Result<Vec<Job>, StoreError> {
            self.inner.jobs_missing_embedding(limit).await
        }

        async fn set_job_embedding(
            &self,
            id: &str,
            embedding: &[f32],
        ) -> Result<(), StoreError> {
            self.inner.set_job_embedding(id, embedding).await
        }

        async fn insert_match(&self, _record: &JobMatchInsert) -> Result<u64, StoreError> {
            Err(StoreError::Mapping("disk full".into()))
        }

        async fn matches_for_resume(
            &self,
            resume_id: &str,
            limit: i64,
        ) -> Result<Vec<crate::db::MatchRecord>, StoreError> {
            self.inner.matches_for_resume(resume_id, limit).await
        }
    }

    #[tokio::test]
    async fn fallback_path_ranks_local_corpus_without_vectors() {
        let store = Arc::new(MemoryStore::with_jobs(vec![
            job(
                "job-b",
                "SalesCo",
                &["salesforce", "crm"],
                ExperienceTier::Leadership,
            ),
            job(
                "job-a",
                "Acme",
                &["react", "typescript", "node.js"],
                ExperienceTier::Mid,
            ),
        ]));
        store.add_resume(resume());

        let svc = service(store.clone(), Arc::new(InMemoryIndex::new(4)));
        let outcome = svc.find_matches("r1", 10).await.unwrap();

        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.matches[0].job.id, "job-a");
        assert_eq!(outcome.matches[0].score, 0.77);
        assert_eq!(outcome.matches[1].job.id, "job-b");
        assert_eq!(outcome.matches[1].score, 0.10);

        assert_eq!(outcome.stats.total_jobs, 2);
        assert_eq!(outcome.stats.matches_found, 2);
        assert!((outcome.stats.avg_match_score - 0.44).abs() < 1e-9);

        // One append-only audit record per returned match.
        assert_eq!(store.match_count(), 2);
    }

    #[tokio::test]
    async fn unknown_resume_is_invalid_input() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store, Arc::new(InMemoryIndex::new(4)));

        match svc.find_matches("ghost", 5).await {
            Err(MatchError::InvalidInput(msg)) => assert!(msg.contains("ghost")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn index_failure_degrades_to_local_scan() {
        let store = Arc::new(MemoryStore::with_jobs(vec![job(
            "job-a",
            "Acme",
            &["react"],
            ExperienceTier::Mid,
        )]));
        let mut with_vector = resume();
        with_vector.embedding = Some(vec![1.0, 0.0, 0.0, 0.0]);
        store.add_resume(with_vector);

        let svc = service(store, Arc::new(FailingIndex));
        let outcome = svc.find_matches("r1", 5).await.unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].job.id, "job-a");
    }

    #[tokio::test]
    async fn retrieval_path_uses_index_candidates_and_diversifies() {
        let index = Arc::new(InMemoryIndex::new(4));
        let mut jobs = Vec::new();
        for i in 0..6 {
            let mut j = job(
                &format!("acme-{i}"),
                "Acme",
                &["react", "node.js"],
                ExperienceTier::Mid,
            );
            j.embedding = Some(vec![1.0, i as f32 * 0.1, 0.0, 0.0]);
            index
                .upsert(
                    &j.id,
                    j.embedding.as_ref().unwrap(),
                    IndexMetadata {
                        company: j.company.clone(),
                        location: j.location.clone(),
                        industry: j.industry.clone(),
                    },
                )
                .await
                .unwrap();
            jobs.push(j);
        }
        let mut beta = job("beta-0", "Beta", &["react"], ExperienceTier::Mid);
        beta.embedding = Some(vec![0.9, 0.1, 0.0, 0.0]);
        index
            .upsert(
                &beta.id,
                beta.embedding.as_ref().unwrap(),
                IndexMetadata {
                    company: beta.company.clone(),
                    ..IndexMetadata::default()
                },
            )
            .await
            .unwrap();
        jobs.push(beta);

        let store = Arc::new(MemoryStore::with_jobs(jobs));
        let mut with_vector = resume();
        with_vector.embedding = Some(vec![1.0, 0.0, 0.0, 0.0]);
        store.add_resume(with_vector);

        let svc = service(store.clone(), index);
        let outcome = svc.find_matches("r1", 3).await.unwrap();

        assert_eq!(outcome.matches.len(), 3);
        let ids: std::collections::HashSet<_> =
            outcome.matches.iter().map(|m| m.job.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(store.match_count(), 3);
    }

    #[tokio::test]
    async fn persistence_failure_does_not_fail_the_request() {
        let inner = MemoryStore::with_jobs(vec![job(
            "job-a",
            "Acme",
            &["react"],
            ExperienceTier::Mid,
        )]);
        inner.add_resume(resume());
        let store = Arc::new(FailingInsertStore { inner });

        let svc = MatchingService::new(
            store,
            Arc::new(InMemoryIndex::new(4)),
            None,
            Arc::new(KeepAllFilter),
            PipelineConfig::default(),
        );

        let outcome = svc.find_matches("r1", 5).await.unwrap();
        assert_eq!(outcome.matches.len(), 1);
    }

    #[tokio::test]
    async fn limit_is_clamped_and_respected() {
        let store = Arc::new(MemoryStore::with_jobs(
            (0..8)
                .map(|i| {
                    job(
                        &format!("job-{i}"),
                        &format!("company-{i}"),
                        &["react"],
                        ExperienceTier::Mid,
                    )
                })
                .collect(),
        ));
        store.add_resume(resume());

        let svc = service(store, Arc::new(InMemoryIndex::new(4)));
        let outcome = svc.find_matches("r1", 3).await.unwrap();
        assert_eq!(outcome.matches.len(), 3);

        // A zero limit clamps up to one result rather than erroring.
        let svc_store = Arc::new(MemoryStore::with_jobs(vec![job(
            "only",
            "Acme",
            &["react"],
            ExperienceTier::Mid,
        )]));
        svc_store.add_resume(resume());
        let svc = service(svc_store, Arc::new(InMemoryIndex::new(4)));
        let outcome = svc.find_matches("r1", 0).await.unwrap();
        assert_eq!(outcome.matches.len(), 1);
    }
}
