//! Graph data model: nodes, edges, and the graph container
//!
//! The serialized form of these types is the stable export/import contract,
//! so field names follow the camelCase JSON convention (`latexLabel`,
//! `sectionPath`, `type`).

use crate::{EntityType, RelationType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form, shallow-mergeable metadata attached to nodes and edges
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Prefix for node ids derived from an explicit LaTeX label
pub const LABEL_ID_PREFIX: &str = "tex:";

/// Preferred node id for an explicit label
///
/// A conventional `kind:` prefix on the label (e.g. `def:`, `thm:`, `eq:`) is
/// dropped so that `\label{def:x}` and a later `\ref{def:x}` both land on
/// `tex:x`. Two labels can share a stem (`thm:pyth`, `eq:pyth`), so ids that
/// enter a graph are allocated through [`assign_label_id`].
pub fn label_node_id(label: &str) -> String {
    format!("{}{}", LABEL_ID_PREFIX, label_stem(label))
}

/// Label with its leading `kind:` prefix removed
pub fn label_stem(label: &str) -> &str {
    let label = label.trim();
    match label.split_once(':') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => label,
    }
}

/// Node id for `label` that no other label in `labels` already owns
///
/// `labels` maps labels to node ids. A label already present keeps its id;
/// otherwise a free id is chosen by [`free_label_id`] and recorded before
/// returning, so distinct labels never share an id.
pub fn assign_label_id(label: &str, labels: &mut HashMap<String, String>) -> String {
    let label = label.trim();
    if let Some(id) = labels.get(label) {
        return id.clone();
    }
    let id = free_label_id(label, |id| labels.values().any(|owned| owned == id));
    labels.insert(label.to_string(), id.clone());
    id
}

/// First id for `label` not rejected by `taken`
///
/// Tries the stem form `tex:<stem>`, then the full form `tex:<label>`, then
/// `tex:<label>~<n>`.
pub fn free_label_id(label: &str, taken: impl Fn(&str) -> bool) -> String {
    let label = label.trim();
    let preferred = label_node_id(label);
    if !taken(&preferred) {
        return preferred;
    }
    let qualified = format!("{}{}", LABEL_ID_PREFIX, label);
    let mut id = qualified.clone();
    let mut n = 2;
    while taken(&id) {
        id = format!("{}~{}", qualified, n);
        n += 1;
    }
    id
}

/// Where a node came from in the source corpus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSource {
    /// Source file path
    pub file: String,

    /// Explicit `\label{...}` carried by the originating text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex_label: Option<String>,

    /// `[file, heading, ...]` path of the originating chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_path: Option<Vec<String>>,
}

impl NodeSource {
    /// Shallow-merge `other` into `self`; present fields of `other` win
    pub fn merge_from(&mut self, other: &NodeSource) {
        if !other.file.is_empty() {
            self.file = other.file.clone();
        }
        if other.latex_label.is_some() {
            self.latex_label = other.latex_label.clone();
        }
        if other.section_path.is_some() {
            self.section_path = other.section_path.clone();
        }
    }
}

/// A mathematical entity in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Globally unique join key
    pub id: String,

    /// Entity classification
    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// Human-readable title
    pub title: String,

    /// Literal source text (LaTeX)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<NodeSource>,

    /// Arbitrary metadata (solutions, original content, concept kind, ...)
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

impl GraphNode {
    /// Create a node with no content, source, or metadata
    pub fn new(id: impl Into<String>, entity_type: EntityType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type,
            title: title.into(),
            content: None,
            source: None,
            meta: Meta::new(),
        }
    }

    /// Builder: set content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Builder: set source
    pub fn with_source(mut self, source: NodeSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Builder: set one metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// The explicit label, if the node carries one
    pub fn latex_label(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|s| s.latex_label.as_deref())
            .filter(|l| !l.trim().is_empty())
    }

    /// Content or the empty string
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Dedup key for edges: `(source, type, target, chunkId)`
pub type EdgeKey = (String, RelationType, String, Option<String>);

/// A typed relation between two node ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Optional edge identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Relation classification
    #[serde(rename = "type")]
    pub relation_type: RelationType,

    /// Source node id
    pub source: String,

    /// Target node id
    pub target: String,

    /// Short justification, e.g. `reference: def:x`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,

    /// Arbitrary metadata (`chunkId`, ...)
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

impl GraphEdge {
    /// Create an edge with no evidence or metadata
    pub fn new(
        relation_type: RelationType,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            relation_type,
            source: source.into(),
            target: target.into(),
            evidence: None,
            meta: Meta::new(),
        }
    }

    /// Builder: set evidence
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// Builder: attribute the edge to a chunk via `meta.chunkId`
    pub fn with_chunk_id(mut self, chunk_id: impl Into<String>) -> Self {
        self.meta
            .insert("chunkId".to_string(), serde_json::Value::String(chunk_id.into()));
        self
    }

    /// The chunk this edge was extracted from
    pub fn chunk_id(&self) -> Option<&str> {
        self.meta.get("chunkId").and_then(|v| v.as_str())
    }

    /// Dedup key
    pub fn key(&self) -> EdgeKey {
        (
            self.source.clone(),
            self.relation_type,
            self.target.clone(),
            self.chunk_id().map(str::to_string),
        )
    }

    /// Whether the edge points at its own source
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// A complete node/edge graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<GraphNode>,

    /// Edges in insertion order
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the graph has no nodes and no edges
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Find a node by id (linear scan)
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Labels carried by nodes, mapped to the ids of those nodes
    pub fn label_index(&self) -> HashMap<String, String> {
        self.nodes
            .iter()
            .filter_map(|n| n.latex_label().map(|l| (l.trim().to_string(), n.id.clone())))
            .collect()
    }
}
