//! Alias maps produced by freezing, applied to later extraction batches

use crate::merge::{absorb, rewrite_edges};
use std::collections::{BTreeMap, HashMap};
use texkg_domain::{ExtractionResult, GraphNode};

/// Id and label tables mapping onto frozen canonical ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    ids: BTreeMap<String, String>,
    labels: BTreeMap<String, String>,
}

impl AliasMap {
    /// Empty map (every id resolves to itself)
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` resolves to `canonical`
    pub fn insert(&mut self, id: impl Into<String>, canonical: impl Into<String>) {
        self.ids.insert(id.into(), canonical.into());
    }

    /// Record that nodes carrying `label` resolve to `canonical`
    pub fn insert_label(&mut self, label: impl Into<String>, canonical: impl Into<String>) {
        self.labels.insert(label.into(), canonical.into());
    }

    /// Canonical id for `id`; unknown ids resolve to themselves
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.ids.get(id).map(String::as_str).unwrap_or(id)
    }

    /// Canonical id for a label seen during freezing
    pub fn resolve_label(&self, label: &str) -> Option<&str> {
        self.labels.get(label.trim()).map(String::as_str)
    }

    /// Canonical id for a node: its label first, then its id
    ///
    /// Labels are matched verbatim; a label unseen during freezing falls back
    /// to the node's own id.
    pub fn canonical_for(&self, node: &GraphNode) -> String {
        node.latex_label()
            .and_then(|label| self.resolve_label(label))
            .unwrap_or_else(|| self.resolve(&node.id))
            .to_string()
    }

    /// Number of ids known to the map
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no id is known
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether every known id resolves to itself
    pub fn is_identity(&self) -> bool {
        self.ids.iter().all(|(id, canonical)| id == canonical)
    }

    /// `(alias, canonical)` pairs that actually rename an id
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ids
            .iter()
            .filter(|(id, canonical)| id != canonical)
            .map(|(id, canonical)| (id.as_str(), canonical.as_str()))
    }
}

/// Rewrite a post-freeze extraction batch onto canonical ids
///
/// Nodes collapsing onto one id are merged with the same field rules as the
/// freeze; edges are remapped, self-loops dropped and duplicates removed.
/// Warnings pass through untouched.
pub fn apply_alias_mapping(result: ExtractionResult, map: &AliasMap) -> ExtractionResult {
    let mut renamed: HashMap<String, String> = HashMap::new();
    let mut nodes: Vec<GraphNode> = Vec::with_capacity(result.nodes.len());
    let mut slot: HashMap<String, usize> = HashMap::new();

    for mut node in result.nodes {
        let canonical = map.canonical_for(&node);
        if canonical != node.id {
            renamed.insert(node.id.clone(), canonical.clone());
            node.id = canonical;
        }
        match slot.get(&node.id) {
            Some(&i) => absorb(&mut nodes[i], node),
            None => {
                slot.insert(node.id.clone(), nodes.len());
                nodes.push(node);
            }
        }
    }

    let edges = rewrite_edges(result.edges, |id| match renamed.get(id) {
        Some(canonical) => canonical.clone(),
        None => map.resolve(id).to_string(),
    });

    ExtractionResult {
        nodes,
        edges,
        warnings: result.warnings,
    }
}
