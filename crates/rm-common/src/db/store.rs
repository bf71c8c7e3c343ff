use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::{
    fetch_all_jobs, fetch_job_by_id, fetch_jobs_missing_embedding, fetch_matches_for_resume,
    fetch_resume_by_id, insert_job_match, update_job_embedding, JobMatchInsert, MatchRecord,
    PgPool, StoreError,
};
use crate::{Job, Resume};

/// Job/résumé/match persistence consumed by the pipeline. Kept behind a
/// trait so the deterministic core runs against `MemoryStore` in tests.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn get_resume(&self, id: &str) -> Result<Option<Resume>, StoreError>;

    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError>;

    async fn all_jobs(&self) -> Result<Vec<Job>, StoreError>;

    async fn jobs_missing_embedding(&self, limit: i64) -> Result<Vec<Job>, StoreError>;

    async fn set_job_embedding(&self, id: &str, embedding: &[f32]) -> Result<(), StoreError>;

    async fn insert_match(&self, record: &JobMatchInsert) -> Result<u64, StoreError>;

    async fn matches_for_resume(
        &self,
        resume_id: &str,
        limit: i64,
    ) -> Result<Vec<MatchRecord>, StoreError>;
}

pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn get_resume(&self, id: &str) -> Result<Option<Resume>, StoreError> {
        fetch_resume_by_id(&self.pool, id).await
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        fetch_job_by_id(&self.pool, id).await
    }

    async fn all_jobs(&self) -> Result<Vec<Job>, StoreError> {
        fetch_all_jobs(&self.pool).await
    }

    async fn jobs_missing_embedding(&self, limit: i64) -> Result<Vec<Job>, StoreError> {
        fetch_jobs_missing_embedding(&self.pool, limit).await
    }

    async fn set_job_embedding(&self, id: &str, embedding: &[f32]) -> Result<(), StoreError> {
        update_job_embedding(&self.pool, id, embedding).await?;
        Ok(())
    }

    async fn insert_match(&self, record: &JobMatchInsert) -> Result<u64, StoreError> {
        insert_job_match(&self.pool, record).await
    }

    async fn matches_for_resume(
        &self,
        resume_id: &str,
        limit: i64,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        fetch_matches_for_resume(&self.pool, resume_id, limit).await
    }
}

/// In-process store for tests and demo wiring. Matches are appended, never
/// replaced, mirroring the database semantics.
#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<Vec<Job>>,
    resumes: RwLock<HashMap<String, Resume>>,
    matches: RwLock<Vec<MatchRecord>>,
    next_match_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        let store = Self::new();
        *store.jobs.write().expect("store lock poisoned") = jobs;
        store
    }

    pub fn add_resume(&self, resume: Resume) {
        self.resumes
            .write()
            .expect("store lock poisoned")
            .insert(resume.id.clone(), resume);
    }

    pub fn add_job(&self, job: Job) {
        self.jobs.write().expect("store lock poisoned").push(job);
    }

    pub fn match_count(&self) -> usize {
        self.matches.read().expect("store lock poisoned").len()
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn get_resume(&self, id: &str) -> Result<Option<Resume>, StoreError> {
        Ok(self
            .resumes
            .read()
            .expect("store lock poisoned")
            .get(id)
            .cloned())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        Ok(self
            .jobs
            .read()
            .expect("store lock poisoned")
            .iter()
            .find(|job| job.id == id)
            .cloned())
    }

    async fn all_jobs(&self) -> Result<Vec<Job>, StoreError> {
        Ok(self.jobs.read().expect("store lock poisoned").clone())
    }

    async fn jobs_missing_embedding(&self, limit: i64) -> Result<Vec<Job>, StoreError> {
        Ok(self
            .jobs
            .read()
            .expect("store lock poisoned")
            .iter()
            .filter(|job| job.embedding.is_none())
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn set_job_embedding(&self, id: &str, embedding: &[f32]) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().expect("store lock poisoned");
        if let Some(job) = jobs.iter_mut().find(|job| job.id == id) {
            job.embedding = Some(embedding.to_vec());
        }
        Ok(())
    }

    async fn insert_match(&self, record: &JobMatchInsert) -> Result<u64, StoreError> {
        let id = self.next_match_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.matches
            .write()
            .expect("store lock poisoned")
            .push(MatchRecord {
                id,
                resume_id: record.resume_id.clone(),
                job_id: record.job_id.clone(),
                score: record.score,
                confidence: record.confidence,
                matching_skills: record.matching_skills.clone(),
                explanation: record.explanation.clone(),
                match_run_id: record.match_run_id.clone(),
                engine_version: record.engine_version.clone(),
                created_at: Utc::now(),
            });
        Ok(1)
    }

    async fn matches_for_resume(
        &self,
        resume_id: &str,
        limit: i64,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let matches = self.matches.read().expect("store lock poisoned");
        let mut records: Vec<MatchRecord> = matches
            .iter()
            .filter(|m| m.resume_id == resume_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }
}
