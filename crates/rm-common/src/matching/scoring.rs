use super::{
    experience::experience_alignment,
    similarity::cosine_similarity,
    skills::skill_overlap,
    weights::{Weights, FALLBACK_WEIGHTS, VECTOR_WEIGHTS},
};
use crate::{error::MatchError, Confidence, Job, Resume};

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub vector_weights: Weights,
    pub fallback_weights: Weights,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            vector_weights: VECTOR_WEIGHTS,
            fallback_weights: FALLBACK_WEIGHTS,
        }
    }
}

/// One scored (résumé, job) pair. Created per matching request and persisted
/// as an audit record; never mutated afterward.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub job: Job,
    /// Final weighted score, clamped to [0.0, 1.0] and rounded to two
    /// decimal places.
    pub score: f64,
    /// Normalized résumé skills that matched some job skill.
    pub matching_skills: Vec<String>,
    pub confidence: Confidence,
    pub explanation: String,
    /// Cosine similarity when both sides had embeddings and it was positive;
    /// `None` means the fallback weighting was used.
    pub vector_score: Option<f64>,
    pub skill_overlap: f64,
    pub experience_alignment: f64,
}

pub struct MatchScorer {
    config: MatchingConfig,
}

impl MatchScorer {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn default() -> Self {
        Self::new(MatchingConfig::default())
    }

    /// Combine vector similarity, skill overlap, and experience alignment
    /// into one score plus a confidence tier. Pure computation; fails only
    /// on malformed input.
    pub fn score(&self, job: &Job, resume: &Resume) -> Result<MatchResult, MatchError> {
        job.validate()?;
        resume.validate()?;

        // A similarity of exactly 0 (or below) is indistinguishable from
        // "no vector" on purpose: both fall back to the skills-driven
        // weighting.
        let vector_score = match (&resume.embedding, &job.embedding) {
            (Some(r), Some(j)) => {
                let raw = cosine_similarity(r, j)?;
                (raw > 0.0).then_some(raw)
            }
            _ => None,
        };

        let overlap = skill_overlap(&resume.profile.skills, &job.skills);
        let experience =
            experience_alignment(job.experience_tier, resume.profile.experience_tier);

        let raw_total = match vector_score {
            Some(vector) => {
                let w = self.config.vector_weights;
                w.vector * vector + w.skills * overlap.score + w.experience * experience
            }
            None => {
                let w = self.config.fallback_weights;
                w.skills * overlap.score + w.experience * experience
            }
        };

        // Loose containment can push the overlap share past its weight, so
        // clamp before rounding.
        let score = round2(raw_total.clamp(0.0, 1.0));

        let confidence = match vector_score {
            Some(_) => confidence_with_vector(score, overlap.matched.len()),
            None => confidence_without_vector(overlap.score, overlap.matched.len()),
        };

        let explanation = build_explanation(job, &overlap.matched, experience, vector_score);

        Ok(MatchResult {
            job: job.clone(),
            score,
            matching_skills: overlap.matched,
            confidence,
            explanation,
            vector_score,
            skill_overlap: overlap.score,
            experience_alignment: experience,
        })
    }
}

fn confidence_with_vector(score: f64, matched_skills: usize) -> Confidence {
    if score >= 0.75 && matched_skills >= 2 {
        Confidence::High
    } else if score >= 0.55 && matched_skills >= 1 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn confidence_without_vector(overlap: f64, matched_skills: usize) -> Confidence {
    if overlap >= 0.6 && matched_skills >= 3 {
        Confidence::High
    } else if overlap >= 0.3 && matched_skills >= 2 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn build_explanation(
    job: &Job,
    matched: &[String],
    experience: f64,
    vector_score: Option<f64>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if matched.is_empty() {
        parts.push(format!("no skill overlap with {} required skills", job.skills.len()));
    } else {
        parts.push(format!(
            "{} of {} job skills matched ({})",
            matched.len(),
            job.skills.len(),
            matched.join(", ")
        ));
    }

    if experience >= 1.0 {
        parts.push(format!("experience tier matches ({})", job.experience_tier.as_ref()));
    } else {
        parts.push(format!(
            "experience alignment {:.0}% against required tier {}",
            experience * 100.0,
            job.experience_tier.as_ref()
        ));
    }

    match vector_score {
        Some(v) => parts.push(format!("semantic similarity {:.2}", v)),
        None => parts.push("scored without semantic similarity".into()),
    }

    parts.join(" / ")
}
