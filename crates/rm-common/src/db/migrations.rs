use thiserror::Error;
use tracing::{info, instrument};

use crate::db::{PgPool, StoreError};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to run migration {id}: {source}")]
    Failed { id: i32, source: StoreError },
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "jobs, resumes, and append-only job_matches",
        sql: r#"
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    company TEXT NOT NULL DEFAULT '',
    location TEXT NOT NULL DEFAULT '',
    industry TEXT NOT NULL DEFAULT '',
    experience_tier TEXT NOT NULL DEFAULT 'entry',
    work_type TEXT NOT NULL DEFAULT 'onsite',
    skills TEXT[] NOT NULL DEFAULT '{}',
    salary_min INTEGER,
    salary_max INTEGER,
    embedding REAL[],
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS resumes (
    id TEXT PRIMARY KEY,
    raw_text TEXT NOT NULL DEFAULT '',
    skills TEXT[] NOT NULL DEFAULT '{}',
    primary_role TEXT NOT NULL DEFAULT '',
    industries TEXT[] NOT NULL DEFAULT '{}',
    experience_tier TEXT NOT NULL DEFAULT 'entry',
    years_experience REAL NOT NULL DEFAULT 0,
    embedding REAL[],
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS job_matches (
    id BIGSERIAL PRIMARY KEY,
    resume_id TEXT NOT NULL,
    job_id TEXT NOT NULL,
    score DOUBLE PRECISION NOT NULL,
    confidence TEXT NOT NULL,
    matching_skills TEXT[] NOT NULL DEFAULT '{}',
    explanation TEXT NOT NULL DEFAULT '',
    match_run_id TEXT NOT NULL,
    engine_version TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#,
    },
    Migration {
        id: 2,
        description: "lookup indexes for match history and embedding backfill",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_job_matches_resume
    ON job_matches(resume_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_jobs_missing_embedding
    ON jobs(created_at) WHERE embedding IS NULL;
CREATE INDEX IF NOT EXISTS idx_resumes_missing_embedding
    ON resumes(created_at) WHERE embedding IS NULL;
"#,
    },
];

/// Apply unapplied migrations in id order, recording each in the
/// `schema_migrations` ledger.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let client = pool.get().await.map_err(StoreError::Pool)?;

    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );",
        )
        .await
        .map_err(StoreError::Postgres)?;

    for migration in MIGRATIONS {
        let applied = client
            .query_opt(
                "SELECT id FROM schema_migrations WHERE id = $1",
                &[&migration.id],
            )
            .await
            .map_err(StoreError::Postgres)?;
        if applied.is_some() {
            continue;
        }

        client
            .batch_execute(migration.sql)
            .await
            .map_err(|err| MigrationError::Failed {
                id: migration.id,
                source: StoreError::Postgres(err),
            })?;

        client
            .execute(
                "INSERT INTO schema_migrations (id, description) VALUES ($1, $2)",
                &[&migration.id, &migration.description],
            )
            .await
            .map_err(StoreError::Postgres)?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
