pub mod jobs;
pub mod match_records;
pub mod migrations;
pub mod pool;
pub mod resumes;
pub mod store;

use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use jobs::{
    fetch_all_jobs, fetch_job_by_id, fetch_jobs_missing_embedding, update_job_embedding,
};
pub use match_records::{
    fetch_matches_for_resume, insert_job_match, JobMatchInsert, MatchRecord,
};
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, DbPoolError, PgPool};
pub use resumes::{fetch_resume_by_id, fetch_resumes_missing_embedding, update_resume_embedding};
pub use store::{MatchStore, MemoryStore, PgMatchStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map row: {0}")]
    Mapping(String),
}
