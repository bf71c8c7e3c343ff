use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::{AppropriatenessFilter, CompletionBackend, FilterOutcome, RejectedMatch};
use crate::matching::MatchResult;
use crate::ResumeProfile;

/// The reasoning service sees at most this many candidates; anything past
/// the cap is kept unchanged.
const MAX_PROMPT_CANDIDATES: usize = 20;

#[derive(Debug, Deserialize)]
struct JobDecision {
    job_id: String,
    decision: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    confidence_adjustment: Option<String>,
}

/// Appropriateness filter backed by an external reasoning service.
///
/// Sends a structured prompt, expects one `KEEP`/`FILTER_OUT` decision per
/// job with an optional one-step confidence adjustment, and fails open on
/// any transport or parse problem.
pub struct LlmFilter {
    backend: Box<dyn CompletionBackend>,
}

impl LlmFilter {
    pub fn new(backend: Box<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    fn build_prompt(profile: &ResumeProfile, candidates: &[MatchResult]) -> String {
        let mut prompt = String::with_capacity(1024);
        prompt.push_str(
            "You review job matches for a candidate and flag inappropriate ones \
             (seniority mismatch, domain mismatch).\n\nCandidate profile:\n",
        );
        prompt.push_str(&format!(
            "- role: {}\n- experience tier: {} ({} years)\n- skills: {}\n- industries: {}\n",
            profile.primary_role,
            profile.experience_tier.as_ref(),
            profile.years_experience,
            profile.skills.join(", "),
            profile.industries.join(", "),
        ));

        prompt.push_str("\nCandidate jobs:\n");
        for candidate in candidates.iter().take(MAX_PROMPT_CANDIDATES) {
            prompt.push_str(&format!(
                "- job_id: {} | {} at {} | tier: {} | industry: {} | match score: {:.2}\n",
                candidate.job.id,
                candidate.job.title,
                candidate.job.company,
                candidate.job.experience_tier.as_ref(),
                candidate.job.industry,
                candidate.score,
            ));
        }

        prompt.push_str(
            "\nRespond with a JSON array only, one object per job:\n\
             [{\"job_id\": \"...\", \"decision\": \"KEEP\" or \"FILTER_OUT\", \
             \"reason\": \"...\", \"confidence_adjustment\": \"INCREASE\" or \
             \"DECREASE\" or null}]\n",
        );
        prompt
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn parse_decisions(raw: &str) -> Result<Vec<JobDecision>, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

fn apply_decisions(
    candidates: Vec<MatchResult>,
    decisions: &[JobDecision],
    top_k: usize,
) -> FilterOutcome {
    let by_id: HashMap<&str, &JobDecision> = decisions
        .iter()
        .map(|d| (d.job_id.as_str(), d))
        .collect();

    let mut kept = Vec::new();
    let mut rejected = Vec::new();

    for mut candidate in candidates {
        match by_id.get(candidate.job.id.as_str()) {
            Some(decision) if decision.decision.eq_ignore_ascii_case("FILTER_OUT") => {
                rejected.push(RejectedMatch {
                    reason: decision
                        .reason
                        .clone()
                        .unwrap_or_else(|| "filtered by reasoning service".into()),
                    result: candidate,
                });
            }
            Some(decision) => {
                match decision
                    .confidence_adjustment
                    .as_deref()
                    .map(str::to_ascii_uppercase)
                    .as_deref()
                {
                    Some("INCREASE") => candidate.confidence = candidate.confidence.increase(),
                    Some("DECREASE") => candidate.confidence = candidate.confidence.decrease(),
                    _ => {}
                }
                kept.push(candidate);
            }
            // Jobs the model did not mention (or never saw) stay in.
            None => kept.push(candidate),
        }
    }

    kept.truncate(top_k);
    FilterOutcome { kept, rejected }
}

fn fail_open(mut candidates: Vec<MatchResult>, top_k: usize) -> FilterOutcome {
    candidates.truncate(top_k);
    FilterOutcome {
        kept: candidates,
        rejected: Vec::new(),
    }
}

#[async_trait]
impl AppropriatenessFilter for LlmFilter {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn filter(
        &self,
        profile: &ResumeProfile,
        candidates: Vec<MatchResult>,
        top_k: usize,
    ) -> FilterOutcome {
        if candidates.is_empty() {
            return FilterOutcome::default();
        }

        let prompt = Self::build_prompt(profile, &candidates);

        let raw = match self.backend.complete(&prompt).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "reasoning service unavailable; keeping candidates unfiltered");
                return fail_open(candidates, top_k);
            }
        };

        match parse_decisions(&raw) {
            Ok(decisions) => apply_decisions(candidates, &decisions, top_k),
            Err(err) => {
                warn!(error = %err, "reasoning service returned unparseable decisions; keeping candidates unfiltered");
                fail_open(candidates, top_k)
            }
        }
    }
}
