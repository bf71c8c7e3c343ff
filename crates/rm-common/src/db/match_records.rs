use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::{PgPool, StoreError};
use crate::Confidence;

/// One persisted match, keyed by (resume_id, job_id) plus the run that
/// produced it. Inserts are append-only: re-running matching for the same
/// résumé records additional rows, preserving match history.
#[derive(Debug, Clone, Default)]
pub struct JobMatchInsert {
    pub resume_id: String,
    pub job_id: String,
    pub score: f64,
    pub confidence: Confidence,
    pub matching_skills: Vec<String>,
    pub explanation: String,
    pub match_run_id: String,
    pub engine_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub id: i64,
    pub resume_id: String,
    pub job_id: String,
    pub score: f64,
    pub confidence: Confidence,
    pub matching_skills: Vec<String>,
    pub explanation: String,
    pub match_run_id: String,
    pub engine_version: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn confidence_from_label(label: &str) -> Confidence {
    match label.to_ascii_lowercase().as_str() {
        "high" => Confidence::High,
        "medium" => Confidence::Medium,
        _ => Confidence::Low,
    }
}

fn record_from_row(row: &Row) -> MatchRecord {
    MatchRecord {
        id: row.get("id"),
        resume_id: row.get("resume_id"),
        job_id: row.get("job_id"),
        score: row.get("score"),
        confidence: confidence_from_label(row.get::<_, String>("confidence").as_str()),
        matching_skills: row.get("matching_skills"),
        explanation: row.get("explanation"),
        match_run_id: row.get("match_run_id"),
        engine_version: row.get("engine_version"),
        created_at: row.get("created_at"),
    }
}

#[instrument(skip(pool, record))]
pub async fn insert_job_match(pool: &PgPool, record: &JobMatchInsert) -> Result<u64, StoreError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare(
            "INSERT INTO job_matches (
                resume_id,
                job_id,
                score,
                confidence,
                matching_skills,
                explanation,
                match_run_id,
                engine_version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .await?;

    let confidence = record.confidence.as_ref().to_string();
    let rows = client
        .execute(
            &stmt,
            &[
                &record.resume_id,
                &record.job_id,
                &record.score,
                &confidence,
                &record.matching_skills,
                &record.explanation,
                &record.match_run_id,
                &record.engine_version,
            ],
        )
        .await?;

    Ok(rows)
}

#[instrument(skip(pool))]
pub async fn fetch_matches_for_resume(
    pool: &PgPool,
    resume_id: &str,
    limit: i64,
) -> Result<Vec<MatchRecord>, StoreError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT id, resume_id, job_id, score, confidence, matching_skills, \
                    explanation, match_run_id, engine_version, created_at \
             FROM job_matches \
             WHERE resume_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2",
            &[&resume_id, &limit],
        )
        .await?;
    Ok(rows.iter().map(record_from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_labels_round_trip() {
        for confidence in [Confidence::Low, Confidence::Medium, Confidence::High] {
            assert_eq!(confidence_from_label(confidence.as_ref()), confidence);
        }
    }

    #[test]
    fn unknown_confidence_labels_collapse_to_low() {
        assert_eq!(confidence_from_label("certain"), Confidence::Low);
        assert_eq!(confidence_from_label(""), Confidence::Low);
    }
}
