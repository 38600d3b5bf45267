//! texkg Pipeline
//!
//! Orchestrates a LaTeX-to-graph extraction run.
//!
//! # Overview
//!
//! A [`Pipeline`] owns the graph store and drives one run at a time:
//!
//! 1. Segment the documents into chunks
//! 2. Extract every chunk, locally or through an oracle
//! 3. Commit each chunk's result into the graph in chunk order
//!
//! Oracle runs are phase-aware by default. Phase 1 extracts base concepts
//! strictly sequentially, each call seeing everything committed before it.
//! The namespace is then frozen (see `texkg-unifier`), and phase 2 extracts
//! the rest with bounded concurrency. Results may arrive in any order; they
//! are buffered and committed in chunk order, so the final graph does not
//! depend on oracle latency.
//!
//! Progress is published on a `tokio::sync::watch` channel. A run is
//! cancelled through a [`CancellationToken`]; committed work is kept.
//!
//! # Configuration
//!
//! ```toml
//! mode = "oracle"
//! concurrency = 4
//! phase_aware = true
//! align_concepts = false
//! snapshot_every = 10
//!
//! [sampling]
//! temperature = 0.2
//! top_p = 0.9
//! max_tokens = 8000
//!
//! [extractor]
//! granularity = "section"
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod pipeline;
mod status;

pub use config::{ExtractionMode, PipelineConfig, MAX_CONCURRENCY};
pub use error::PipelineError;
pub use pipeline::{BoxedSnapshotStore, Pipeline};
pub use status::{summarize_warnings, PipelineProgress, PipelineReport, PipelineStatus};
pub use tokio_util::sync::CancellationToken;
