//! Process-level run ID.
//!
//! Each process generates one ULID at first use; every match persisted
//! during that process shares it via `job_matches.match_run_id`. Because
//! inserts are append-only, the run ID is what separates one matching run's
//! history from the next.

use once_cell::sync::Lazy;
use ulid::Ulid;

static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// The process-level run ID. Stable for the process lifetime,
/// lexicographically time-ordered, 26 characters.
#[inline]
pub fn get() -> &'static str {
    &RUN_ID
}

/// A fresh ULID for sub-operations that need their own identity
/// (request IDs, batch sub-runs).
#[inline]
pub fn generate() -> String {
    Ulid::new().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_stable_within_a_process() {
        assert_eq!(get(), get());
        assert_eq!(get().len(), 26);
    }

    #[test]
    fn generate_produces_unique_sortable_ids() {
        let older = generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let newer = generate();
        assert_ne!(older, newer);
        assert!(older < newer);
    }
}
