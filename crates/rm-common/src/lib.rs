pub mod api;
pub mod db;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod index;
pub mod logging;
pub mod matching;
pub mod run_id;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use error::MatchError;

/// Ordered seniority tiers. Ordinal positions drive the experience
/// alignment score, so the variant order is load-bearing.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExperienceTier {
    #[default]
    Entry,
    Mid,
    Senior,
    Leadership,
}

pub const TIER_COUNT: usize = 4;

impl ExperienceTier {
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Lenient parse for free-form labels coming out of résumé parsing and
    /// job feeds. Unrecognized labels collapse to `Entry`.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "entry" | "junior" | "graduate" | "intern" => Self::Entry,
            "mid" | "middle" | "intermediate" | "associate" => Self::Mid,
            "senior" | "staff" | "expert" => Self::Senior,
            "leadership" | "lead" | "principal" | "manager" | "director" | "executive" => {
                Self::Leadership
            }
            _ => Self::Entry,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WorkType {
    #[default]
    Onsite,
    Hybrid,
    Remote,
}

impl WorkType {
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "remote" | "fully remote" | "wfh" => Self::Remote,
            "hybrid" | "flexible" => Self::Hybrid,
            _ => Self::Onsite,
        }
    }
}

/// How trustworthy a match score is. Ordered so that one-step adjustments
/// from the appropriateness filter are plain ordinal moves.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn increase(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        }
    }

    pub fn decrease(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }
}

/// A job posting. Immutable once created except for the embedding, which is
/// attached after generation by the embed worker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub industry: String,
    pub experience_tier: ExperienceTier,
    pub work_type: WorkType,
    pub skills: Vec<String>,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub embedding: Option<Vec<f32>>,
}

impl Job {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.id.trim().is_empty() {
            return Err(MatchError::InvalidInput("job id is required".into()));
        }
        if self.title.trim().is_empty() {
            return Err(MatchError::InvalidInput(format!(
                "job {} has no title",
                self.id
            )));
        }
        if matches!(&self.embedding, Some(v) if v.is_empty()) {
            return Err(MatchError::InvalidInput(format!(
                "job {} has an empty embedding vector",
                self.id
            )));
        }
        Ok(())
    }

    /// Text sent to the embedding provider. Field order is stable so stored
    /// vectors remain comparable across runs.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} at {} ({}, {}). Skills: {}.",
            self.title,
            self.company,
            self.industry,
            self.location,
            self.skills.join(", "),
        )
    }
}

/// Parsed résumé profile. Produced by an external parser and treated as a
/// trusted input to the matching core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResumeProfile {
    pub skills: Vec<String>,
    pub primary_role: String,
    pub industries: Vec<String>,
    pub experience_tier: ExperienceTier,
    pub years_experience: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resume {
    pub id: String,
    pub raw_text: String,
    pub profile: ResumeProfile,
    pub embedding: Option<Vec<f32>>,
}

impl Resume {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.id.trim().is_empty() {
            return Err(MatchError::InvalidInput("resume id is required".into()));
        }
        if self.profile.years_experience < 0.0 {
            return Err(MatchError::InvalidInput(format!(
                "resume {} has negative years of experience",
                self.id
            )));
        }
        if matches!(&self.embedding, Some(v) if v.is_empty()) {
            return Err(MatchError::InvalidInput(format!(
                "resume {} has an empty embedding vector",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_totally_ordered() {
        assert!(ExperienceTier::Entry < ExperienceTier::Mid);
        assert!(ExperienceTier::Mid < ExperienceTier::Senior);
        assert!(ExperienceTier::Senior < ExperienceTier::Leadership);
        assert_eq!(ExperienceTier::Leadership.ordinal(), TIER_COUNT - 1);
    }

    #[test]
    fn unknown_tier_labels_default_to_entry() {
        assert_eq!(
            ExperienceTier::parse_lenient("wizard"),
            ExperienceTier::Entry
        );
        assert_eq!(ExperienceTier::parse_lenient(""), ExperienceTier::Entry);
        assert_eq!(
            ExperienceTier::parse_lenient("Principal"),
            ExperienceTier::Leadership
        );
    }

    #[test]
    fn confidence_adjustments_cap_at_bounds() {
        assert_eq!(Confidence::Low.decrease(), Confidence::Low);
        assert_eq!(Confidence::Low.increase(), Confidence::Medium);
        assert_eq!(Confidence::High.increase(), Confidence::High);
        assert_eq!(Confidence::High.decrease(), Confidence::Medium);
    }

    #[test]
    fn job_validation_requires_id_and_title() {
        let mut job = Job {
            id: "j1".into(),
            title: "Backend Engineer".into(),
            ..Job::default()
        };
        assert!(job.validate().is_ok());

        job.title.clear();
        assert!(job.validate().is_err());

        job.title = "Backend Engineer".into();
        job.id = "  ".into();
        assert!(job.validate().is_err());
    }

    #[test]
    fn resume_validation_rejects_empty_embedding() {
        let resume = Resume {
            id: "r1".into(),
            embedding: Some(vec![]),
            ..Resume::default()
        };
        assert!(resume.validate().is_err());
    }
}
