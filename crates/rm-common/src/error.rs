use thiserror::Error;

/// Error taxonomy for the matching core.
///
/// `InvalidInput` and `DimensionMismatch` are deterministic and surface to
/// the caller; `ServiceUnavailable` is absorbed by the pipeline's fallback
/// paths; `Persistence` is logged without invalidating computed results.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<crate::db::StoreError> for MatchError {
    fn from(value: crate::db::StoreError) -> Self {
        MatchError::Persistence(value.to_string())
    }
}

impl From<crate::index::IndexError> for MatchError {
    fn from(value: crate::index::IndexError) -> Self {
        MatchError::ServiceUnavailable(value.to_string())
    }
}

impl From<crate::embedding::EmbedError> for MatchError {
    fn from(value: crate::embedding::EmbedError) -> Self {
        MatchError::ServiceUnavailable(value.to_string())
    }
}
