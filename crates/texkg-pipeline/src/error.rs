//! Error types for pipeline runs

use thiserror::Error;

/// Fatal pipeline errors
///
/// Per-chunk oracle failures are not errors; they become warnings on the
/// run report.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No documents, or documents yielding no chunks
    #[error("No input: {0}")]
    EmptyInput(String),

    /// Invalid configuration or missing collaborator
    #[error("Configuration error: {0}")]
    Config(String),

    /// An extraction task ended abnormally
    #[error("Extraction task failed: {0}")]
    Task(String),
}
