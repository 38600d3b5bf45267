//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline core and its
//! collaborators. Implementations live in other crates (texkg-llm,
//! texkg-store).

use crate::{Graph, OracleError, SchemaSelection, Snapshot, SnapshotId, SnapshotMeta};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling parameters forwarded to the oracle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.95,
            max_tokens: 4096,
        }
    }
}

/// A black-box text-in/text-out extraction oracle
///
/// Implemented by the infrastructure layer (texkg-llm). Output is never
/// assumed to be well-formed JSON.
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    /// Send a prompt and return the raw textual answer
    async fn invoke(&self, prompt: &str, params: &SamplingParams) -> Result<String, OracleError>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

/// Trait for persisting graph snapshots
///
/// Implemented by the infrastructure layer (texkg-store). The pipeline only
/// calls `save`; the rest is operator-facing.
pub trait SnapshotStore {
    /// Error type for store operations
    type Error;

    /// Persist a graph and return the new snapshot id
    fn save(
        &mut self,
        graph: &Graph,
        schema: &SchemaSelection,
        note: Option<&str>,
    ) -> Result<SnapshotId, Self::Error>;

    /// List snapshot metadata, newest first
    fn list(&self) -> Result<Vec<SnapshotMeta>, Self::Error>;

    /// Load a snapshot by id
    fn load(&self, id: SnapshotId) -> Result<Option<Snapshot>, Self::Error>;

    /// Delete every snapshot, returning how many were removed
    fn delete_all(&mut self) -> Result<usize, Self::Error>;

    /// Delete all but the newest snapshot, returning how many were removed
    fn delete_all_but_latest(&mut self) -> Result<usize, Self::Error>;
}
