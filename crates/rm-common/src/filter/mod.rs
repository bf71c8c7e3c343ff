pub mod client;
pub mod llm;

use async_trait::async_trait;

pub use client::{CompletionBackend, ReasoningClient, ReasoningConfig, ReasoningError};
pub use llm::LlmFilter;

use crate::matching::MatchResult;
use crate::ResumeProfile;

#[derive(Debug, Clone)]
pub struct RejectedMatch {
    pub result: MatchResult,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub kept: Vec<MatchResult>,
    pub rejected: Vec<RejectedMatch>,
}

/// Last-pass semantic appropriateness check (seniority mismatch, domain
/// mismatch) over already-ranked candidates.
///
/// Implementations must fail open: whatever goes wrong, the outcome carries
/// the original candidates truncated to `top_k`. The trait therefore has no
/// error channel.
#[async_trait]
pub trait AppropriatenessFilter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn filter(
        &self,
        profile: &ResumeProfile,
        candidates: Vec<MatchResult>,
        top_k: usize,
    ) -> FilterOutcome;
}

/// Deterministic implementation: keeps the first `top_k` candidates
/// unchanged. Used in tests and whenever no reasoning service is
/// configured.
pub struct KeepAllFilter;

#[async_trait]
impl AppropriatenessFilter for KeepAllFilter {
    fn name(&self) -> &'static str {
        "keep_all"
    }

    async fn filter(
        &self,
        _profile: &ResumeProfile,
        mut candidates: Vec<MatchResult>,
        top_k: usize,
    ) -> FilterOutcome {
        candidates.truncate(top_k);
        FilterOutcome {
            kept: candidates,
            rejected: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Confidence, Job};

    fn candidate(id: &str, score: f64) -> MatchResult {
        MatchResult {
            job: Job {
                id: id.into(),
                title: "Engineer".into(),
                ..Job::default()
            },
            score,
            matching_skills: vec![],
            confidence: Confidence::Medium,
            explanation: String::new(),
            vector_score: None,
            skill_overlap: 0.0,
            experience_alignment: 0.0,
        }
    }

    #[tokio::test]
    async fn keep_all_truncates_to_top_k_in_order() {
        let candidates = vec![
            candidate("a", 0.9),
            candidate("b", 0.8),
            candidate("c", 0.7),
        ];

        let outcome = KeepAllFilter
            .filter(&ResumeProfile::default(), candidates, 2)
            .await;

        let ids: Vec<_> = outcome.kept.iter().map(|m| m.job.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(outcome.rejected.is_empty());
    }
}
