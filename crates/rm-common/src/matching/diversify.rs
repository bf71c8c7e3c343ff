use super::scoring::MatchResult;

/// Greedy Maximal Marginal Relevance settings. `lambda` weighs relevance
/// against diversity; 0.7 biases toward relevance.
#[derive(Debug, Clone)]
pub struct MmrConfig {
    pub lambda: f64,
    pub max_results: usize,
}

impl MmrConfig {
    pub fn new(max_results: usize) -> Self {
        Self {
            lambda: 0.7,
            max_results,
        }
    }
}

/// Re-rank matches so the top of the list is not dominated by one company,
/// location, or industry. Greedy; ties go to the earlier candidate, so a
/// pre-sorted input stays deterministic.
pub fn diversify(ranked: Vec<MatchResult>, config: &MmrConfig) -> Vec<MatchResult> {
    if config.max_results == 0 {
        return Vec::new();
    }
    if ranked.len() <= config.max_results {
        return ranked;
    }

    let mut pool = ranked;
    let mut selected: Vec<MatchResult> = Vec::with_capacity(config.max_results);

    // First pick is pure relevance.
    let first = argmax(&pool, |candidate| candidate.score);
    selected.push(pool.remove(first));

    while selected.len() < config.max_results && !pool.is_empty() {
        let best = argmax(&pool, |candidate| {
            let diversity = diversity_penalty(&selected, candidate);
            config.lambda * candidate.score + (1.0 - config.lambda) * diversity
        });
        selected.push(pool.remove(best));
    }

    selected
}

/// Starts at 1.0 and shrinks multiplicatively with repetition among the
/// already-selected results. The company penalty is steep enough that a
/// third pick from the same company only happens when nothing else is left.
fn diversity_penalty(selected: &[MatchResult], candidate: &MatchResult) -> f64 {
    let mut diversity = 1.0f64;

    let same_company = selected
        .iter()
        .filter(|s| s.job.company == candidate.job.company)
        .count();
    diversity *= 0.3f64.powi(same_company as i32);

    let same_location = selected
        .iter()
        .filter(|s| s.job.location == candidate.job.location)
        .count();
    if same_location > 2 {
        diversity *= 0.8;
    }

    let same_industry = selected
        .iter()
        .filter(|s| s.job.industry == candidate.job.industry)
        .count();
    if same_industry > 3 {
        diversity *= 0.9;
    }

    diversity
}

fn argmax(pool: &[MatchResult], mut key: impl FnMut(&MatchResult) -> f64) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (idx, candidate) in pool.iter().enumerate() {
        let value = key(candidate);
        if value > best_value {
            best = idx;
            best_value = value;
        }
    }
    best
}
