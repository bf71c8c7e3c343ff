use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::MatchRecord;
use crate::matching::{MatchOutcome, MatchResult, MatchStats};
use crate::Confidence;

/// One ranked match as returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub industry: String,
    pub score: f64,
    pub confidence: Confidence,
    pub matching_skills: Vec<String>,
    pub explanation: String,
    /// Present only when semantic similarity contributed to the score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_score: Option<f64>,
}

impl From<&MatchResult> for MatchResponse {
    fn from(result: &MatchResult) -> Self {
        Self {
            job_id: result.job.id.clone(),
            title: result.job.title.clone(),
            company: result.job.company.clone(),
            location: result.job.location.clone(),
            industry: result.job.industry.clone(),
            score: result.score,
            confidence: result.confidence,
            matching_skills: result.matching_skills.clone(),
            explanation: result.explanation.clone(),
            vector_score: result.vector_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStatsDto {
    pub total_jobs: usize,
    pub matches_found: usize,
    pub avg_match_score: f64,
    pub processing_time_ms: u64,
}

impl From<&MatchStats> for MatchStatsDto {
    fn from(stats: &MatchStats) -> Self {
        Self {
            total_jobs: stats.total_jobs,
            matches_found: stats.matches_found,
            avg_match_score: stats.avg_match_score,
            processing_time_ms: stats.processing_time_ms,
        }
    }
}

/// Response envelope for `POST /api/matches`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    pub matches: Vec<MatchResponse>,
    pub stats: MatchStatsDto,
}

impl From<&MatchOutcome> for FindMatchesResponse {
    fn from(outcome: &MatchOutcome) -> Self {
        Self {
            matches: outcome.matches.iter().map(MatchResponse::from).collect(),
            stats: MatchStatsDto::from(&outcome.stats),
        }
    }
}

/// One persisted match history row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecordDto {
    pub id: i64,
    pub resume_id: String,
    pub job_id: String,
    pub score: f64,
    pub confidence: Confidence,
    pub matching_skills: Vec<String>,
    pub explanation: String,
    pub match_run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&MatchRecord> for MatchRecordDto {
    fn from(record: &MatchRecord) -> Self {
        Self {
            id: record.id,
            resume_id: record.resume_id.clone(),
            job_id: record.job_id.clone(),
            score: record.score,
            confidence: record.confidence,
            matching_skills: record.matching_skills.clone(),
            explanation: record.explanation.clone(),
            match_run_id: record.match_run_id.clone(),
            engine_version: record.engine_version.clone(),
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Job;

    #[test]
    fn response_copies_fields_from_match_result() {
        let result = MatchResult {
            job: Job {
                id: "j1".into(),
                title: "Backend Engineer".into(),
                company: "Acme".into(),
                location: "Berlin".into(),
                industry: "software".into(),
                ..Job::default()
            },
            score: 0.82,
            matching_skills: vec!["rust".into()],
            confidence: Confidence::High,
            explanation: "1 of 2 job skills matched (rust)".into(),
            vector_score: Some(0.9),
            skill_overlap: 0.5,
            experience_alignment: 1.0,
        };

        let response = MatchResponse::from(&result);
        assert_eq!(response.job_id, "j1");
        assert_eq!(response.score, 0.82);
        assert_eq!(response.confidence, Confidence::High);
        assert_eq!(response.vector_score, Some(0.9));
    }

    #[test]
    fn vector_score_is_omitted_from_json_when_absent() {
        let response = MatchResponse {
            job_id: "j1".into(),
            title: "Engineer".into(),
            company: "Acme".into(),
            location: "Berlin".into(),
            industry: "software".into(),
            score: 0.5,
            confidence: Confidence::Low,
            matching_skills: vec![],
            explanation: String::new(),
            vector_score: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("vector_score"));
        assert!(json.contains("\"confidence\":\"low\""));
    }
}
