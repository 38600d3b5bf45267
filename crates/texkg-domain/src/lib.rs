//! texkg Domain Layer
//!
//! This crate contains the data model shared by every stage of the LaTeX
//! knowledge-graph pipeline. It defines the entity and relation vocabularies,
//! the node/edge/graph types, the chunk type produced by segmentation, and the
//! trait interfaces for the out-of-scope collaborators (extraction oracle,
//! snapshot store).
//!
//! ## Key Concepts
//!
//! - **GraphNode**: a mathematical entity, keyed by a globally unique `id`
//! - **GraphEdge**: a typed relation between two node ids (self-loops are rejected)
//! - **LatexChunk**: an immutable, section-aware slice of source text
//! - **ExtractionResult**: the transient nodes/edges/warnings produced for one chunk
//!
//! ## Architecture
//!
//! - Only serialization and error-derive dependencies
//! - No I/O, no pipeline logic
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod entity;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod snapshot;
pub mod traits;

// Re-exports for convenience
pub use chunk::{ChunkGranularity, LatexChunk, SourceFile};
pub use entity::{EntityType, RelationType};
pub use error::{DomainError, OracleError};
pub use extraction::{AlignDecision, ExtractionResult, SchemaSelection, MIN_ALIGN_CONFIDENCE};
pub use graph::{
    assign_label_id, free_label_id, label_node_id, label_stem, EdgeKey, Graph, GraphEdge, GraphNode, Meta,
    NodeSource,
};
pub use snapshot::{Snapshot, SnapshotId, SnapshotMeta};
pub use traits::{ExtractionOracle, SamplingParams, SnapshotStore};
