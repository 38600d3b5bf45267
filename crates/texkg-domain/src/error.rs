//! Domain error types

use thiserror::Error;

/// Errors parsing vocabulary values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Not one of the closed entity types
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Not one of the closed relation types
    #[error("Unknown relation type: {0}")]
    UnknownRelationType(String),

    /// Not a segmentation granularity
    #[error("Unknown chunk granularity: {0}")]
    UnknownGranularity(String),
}

/// Errors from an extraction oracle call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Transport failure (connection refused, HTTP error status, ...)
    #[error("Communication error: {0}")]
    Communication(String),

    /// The oracle answered, but not with usable text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The oracle rejected the call due to rate limiting
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The call did not finish in time
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The call was aborted by the caller
    #[error("Request cancelled")]
    Cancelled,

    /// The oracle is not configured correctly
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl OracleError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OracleError::Communication(_) | OracleError::RateLimited(_) | OracleError::Timeout(_)
        )
    }
}
