use unicode_normalization::UnicodeNormalization;

/// NFKC-normalize, trim, and lowercase a skill label so that comparison is
/// insensitive to width variants and stray whitespace.
pub fn normalize_skill(raw: &str) -> String {
    raw.nfkc().collect::<String>().trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillOverlap {
    /// Résumé skills (normalized) that matched some job skill.
    pub matched: Vec<String>,
    /// `matched / max(job skills, 1)`.
    pub score: f64,
}

/// Fuzzy containment overlap between résumé skills and job skills.
///
/// A résumé skill matches when it is a substring of, or contains, some job
/// skill. The containment is deliberately loose ("java" matches
/// "javascript") to favor recall; downstream behavior depends on this, so
/// keep it loose.
pub fn skill_overlap(resume_skills: &[String], job_skills: &[String]) -> SkillOverlap {
    let job_normalized: Vec<String> = job_skills
        .iter()
        .map(|s| normalize_skill(s))
        .filter(|s| !s.is_empty())
        .collect();

    let mut matched: Vec<String> = Vec::new();
    for raw in resume_skills {
        let skill = normalize_skill(raw);
        if skill.is_empty() || matched.contains(&skill) {
            continue;
        }
        let hit = job_normalized
            .iter()
            .any(|job_skill| job_skill.contains(&skill) || skill.contains(job_skill.as_str()));
        if hit {
            matched.push(skill);
        }
    }

    let score = matched.len() as f64 / job_normalized.len().max(1) as f64;

    SkillOverlap { matched, score }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_matches_count() {
        let overlap = skill_overlap(
            &skills(&["react", "node.js", "aws"]),
            &skills(&["react", "typescript", "node.js"]),
        );
        assert_eq!(overlap.matched, vec!["react", "node.js"]);
        assert!((overlap.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn containment_matches_both_directions() {
        // Résumé skill contained in job skill.
        let overlap = skill_overlap(&skills(&["java"]), &skills(&["javascript"]));
        assert_eq!(overlap.matched, vec!["java"]);

        // Job skill contained in résumé skill.
        let overlap = skill_overlap(&skills(&["javascript"]), &skills(&["java"]));
        assert_eq!(overlap.matched, vec!["javascript"]);
    }

    #[test]
    fn no_job_skills_scores_zero_without_dividing_by_zero() {
        let overlap = skill_overlap(&skills(&["rust"]), &[]);
        assert!(overlap.matched.is_empty());
        assert_eq!(overlap.score, 0.0);
    }

    #[test]
    fn normalization_ignores_case_and_whitespace() {
        let overlap = skill_overlap(&skills(&["  React "]), &skills(&["REACT"]));
        assert_eq!(overlap.matched, vec!["react"]);
        assert_eq!(overlap.score, 1.0);
    }

    #[test]
    fn duplicate_resume_skills_count_once() {
        let overlap = skill_overlap(
            &skills(&["react", "React", "react "]),
            &skills(&["react", "redux"]),
        );
        assert_eq!(overlap.matched, vec!["react"]);
        assert_eq!(overlap.score, 0.5);
    }

    #[test]
    fn score_can_exceed_one_when_resume_is_broader() {
        // Three distinct résumé skills all contained in a single job skill.
        let overlap = skill_overlap(
            &skills(&["java", "script", "javascript"]),
            &skills(&["javascript"]),
        );
        assert_eq!(overlap.matched.len(), 3);
        assert_eq!(overlap.score, 3.0);
    }
}
