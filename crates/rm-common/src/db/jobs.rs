use tokio_postgres::Row;
use tracing::instrument;

use crate::db::{PgPool, StoreError};
use crate::{ExperienceTier, Job, WorkType};

const JOB_COLUMNS: &str = "id, title, company, location, industry, experience_tier, \
                           work_type, skills, salary_min, salary_max, embedding";

pub(crate) fn job_from_row(row: &Row) -> Job {
    Job {
        id: row.get("id"),
        title: row.get("title"),
        company: row.get("company"),
        location: row.get("location"),
        industry: row.get("industry"),
        experience_tier: ExperienceTier::parse_lenient(row.get::<_, String>("experience_tier").as_str()),
        work_type: WorkType::parse_lenient(row.get::<_, String>("work_type").as_str()),
        skills: row.get("skills"),
        salary_min: row.get::<_, Option<i32>>("salary_min").map(|v| v.max(0) as u32),
        salary_max: row.get::<_, Option<i32>>("salary_max").map(|v| v.max(0) as u32),
        embedding: row.get("embedding"),
    }
}

#[instrument(skip(pool))]
pub async fn fetch_job_by_id(pool: &PgPool, id: &str) -> Result<Option<Job>, StoreError> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"),
            &[&id],
        )
        .await?;
    Ok(row.as_ref().map(job_from_row))
}

#[instrument(skip(pool))]
pub async fn fetch_all_jobs(pool: &PgPool) -> Result<Vec<Job>, StoreError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            &format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at, id"),
            &[],
        )
        .await?;
    Ok(rows.iter().map(job_from_row).collect())
}

/// Jobs still waiting for an embedding vector, oldest first. The embed
/// worker drains these in batches.
#[instrument(skip(pool))]
pub async fn fetch_jobs_missing_embedding(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<Job>, StoreError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            &format!(
                "SELECT {JOB_COLUMNS} FROM jobs \
                 WHERE embedding IS NULL ORDER BY created_at, id LIMIT $1"
            ),
            &[&limit],
        )
        .await?;
    Ok(rows.iter().map(job_from_row).collect())
}

#[instrument(skip(pool, embedding))]
pub async fn update_job_embedding(
    pool: &PgPool,
    id: &str,
    embedding: &[f32],
) -> Result<u64, StoreError> {
    let client = pool.get().await?;
    let vector: Vec<f32> = embedding.to_vec();
    let rows = client
        .execute(
            "UPDATE jobs SET embedding = $2 WHERE id = $1",
            &[&id, &vector],
        )
        .await?;
    Ok(rows)
}
