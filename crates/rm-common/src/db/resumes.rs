use tokio_postgres::Row;
use tracing::instrument;

use crate::db::{PgPool, StoreError};
use crate::{ExperienceTier, Resume, ResumeProfile};

const RESUME_COLUMNS: &str =
    "id, raw_text, skills, primary_role, industries, experience_tier, years_experience, embedding";

pub(crate) fn resume_from_row(row: &Row) -> Resume {
    Resume {
        id: row.get("id"),
        raw_text: row.get("raw_text"),
        profile: ResumeProfile {
            skills: row.get("skills"),
            primary_role: row.get("primary_role"),
            industries: row.get("industries"),
            experience_tier: ExperienceTier::parse_lenient(
                row.get::<_, String>("experience_tier").as_str(),
            ),
            years_experience: row.get::<_, f32>("years_experience").max(0.0),
        },
        embedding: row.get("embedding"),
    }
}

#[instrument(skip(pool))]
pub async fn fetch_resume_by_id(pool: &PgPool, id: &str) -> Result<Option<Resume>, StoreError> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {RESUME_COLUMNS} FROM resumes WHERE id = $1"),
            &[&id],
        )
        .await?;
    Ok(row.as_ref().map(resume_from_row))
}

#[instrument(skip(pool))]
pub async fn fetch_resumes_missing_embedding(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<Resume>, StoreError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            &format!(
                "SELECT {RESUME_COLUMNS} FROM resumes \
                 WHERE embedding IS NULL ORDER BY created_at, id LIMIT $1"
            ),
            &[&limit],
        )
        .await?;
    Ok(rows.iter().map(resume_from_row).collect())
}

#[instrument(skip(pool, embedding))]
pub async fn update_resume_embedding(
    pool: &PgPool,
    id: &str,
    embedding: &[f32],
) -> Result<u64, StoreError> {
    let client = pool.get().await?;
    let vector: Vec<f32> = embedding.to_vec();
    let rows = client
        .execute(
            "UPDATE resumes SET embedding = $2 WHERE id = $1",
            &[&id, &vector],
        )
        .await?;
    Ok(rows)
}
