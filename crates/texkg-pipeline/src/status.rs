//! Run state, progress, and reports

use serde::{Deserialize, Serialize};
use std::fmt;

/// Warnings quoted verbatim in the final status message
const QUOTED_WARNINGS: usize = 2;

/// Pipeline state machine
///
/// `idle -> chunking -> extracting -> done | stopped | error`. Terminal
/// states stay put until the next `start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    /// Nothing started yet
    #[default]
    Idle,
    /// Segmenting documents
    Chunking,
    /// Extracting and committing chunk results
    Extracting,
    /// Every chunk committed
    Done,
    /// Cancelled by the operator
    Stopped,
    /// Aborted by an unexpected failure
    Error,
}

impl PipelineStatus {
    /// Whether the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::Done | PipelineStatus::Stopped | PipelineStatus::Error)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStatus::Idle => "idle",
            PipelineStatus::Chunking => "chunking",
            PipelineStatus::Extracting => "extracting",
            PipelineStatus::Done => "done",
            PipelineStatus::Stopped => "stopped",
            PipelineStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Live progress, published after every state change and commit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineProgress {
    /// Current state
    pub status: PipelineStatus,
    /// Units of work in the run (chunks, doubled for phase-aware runs)
    pub total_chunks: usize,
    /// Units committed so far
    pub done_chunks: usize,
    /// Title of the chunk most recently dispatched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_chunk_title: Option<String>,
    /// Final status message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Fatal error text, verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a `start` call that did not fail fatally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    /// `Done` or `Stopped`
    pub status: PipelineStatus,
    /// Number of chunks segmented
    pub chunks: usize,
    /// Chunk indices in the order their results were merged
    pub commit_order: Vec<usize>,
    /// Every warning raised during the run
    pub warnings: Vec<String>,
    /// Node count after the run
    pub nodes: usize,
    /// Edge count after the run
    pub edges: usize,
    /// Nodes folded together by the freeze step
    pub merged_concepts: usize,
    /// Snapshots successfully saved
    pub snapshots_saved: usize,
    /// Final status message
    pub message: String,
}

/// Final status line: first few warnings plus a total
pub fn summarize_warnings(headline: &str, warnings: &[String]) -> String {
    if warnings.is_empty() {
        return headline.to_string();
    }
    let quoted = warnings
        .iter()
        .take(QUOTED_WARNINGS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ");
    let total = if warnings.len() > QUOTED_WARNINGS {
        format!("… (total {})", warnings.len())
    } else {
        String::new()
    };
    format!("{}. Warnings: {}{}", headline, quoted, total)
}
