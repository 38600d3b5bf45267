//! Types for oracle extraction requests

use serde::{Deserialize, Serialize};
use texkg_domain::{Graph, LatexChunk, SchemaSelection};

/// Which pass of a phase-aware run a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Single-pass extraction over the full vocabulary
    Single,
    /// Phase 1: base concepts only, strictly sequential
    Base,
    /// Phase 2: everything else, against a frozen namespace
    Rest,
}

impl Phase {
    /// Vocabulary offered to the oracle in this phase
    pub fn vocabulary(&self, schema: &SchemaSelection) -> SchemaSelection {
        match self {
            Phase::Base => schema.base_concepts(),
            Phase::Single | Phase::Rest => schema.clone(),
        }
    }
}

/// One oracle extraction call
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    /// Chunk to extract from
    pub chunk: &'a LatexChunk,
    /// User-selected vocabulary
    pub schema: &'a SchemaSelection,
    /// Read-only snapshot of the graph so far
    pub graph: &'a Graph,
    /// Pass within the run
    pub phase: Phase,
    /// Whether base-concept identities are fixed
    pub frozen: bool,
    /// Listing of canonical base concepts, if any
    pub concept_registry: Option<&'a str>,
}

impl<'a> OracleRequest<'a> {
    /// Single-pass request with no registry
    pub fn single(chunk: &'a LatexChunk, schema: &'a SchemaSelection, graph: &'a Graph) -> Self {
        Self {
            chunk,
            schema,
            graph,
            phase: Phase::Single,
            frozen: false,
            concept_registry: None,
        }
    }
}
