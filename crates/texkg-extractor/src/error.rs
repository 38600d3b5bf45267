//! Error types for the Extractor

use texkg_domain::OracleError;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Oracle invocation failed
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Oracle call exceeded the configured deadline
    #[error("Extraction timeout after {0}s")]
    Timeout(u64),

    /// Oracle output was not the expected shape
    #[error("Invalid oracle output: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
