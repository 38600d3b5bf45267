//! In-memory graph with dedup-by-key merge semantics
//!
//! Nodes are keyed by `id`; edges by `(source, type, target, chunkId)`.
//! Incoming values override existing ones field by field, `meta` is
//! shallow-merged, and absent optional fields never erase present ones.

use std::collections::{HashMap, HashSet};
use texkg_domain::{EdgeKey, EntityType, Graph, GraphEdge, GraphNode, Meta, NodeSource};
use tracing::debug;

/// Counters describing one merge call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Nodes created
    pub nodes_added: usize,
    /// Existing nodes patched
    pub nodes_updated: usize,
    /// Edges created
    pub edges_added: usize,
    /// Existing edges patched
    pub edges_updated: usize,
    /// Edges refused because `source == target`
    pub self_loops_rejected: usize,
}

/// A partial update applied to an existing node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    /// Replacement entity type
    pub entity_type: Option<EntityType>,
    /// Replacement title
    pub title: Option<String>,
    /// Replacement content
    pub content: Option<String>,
    /// Replacement source
    pub source: Option<NodeSource>,
    /// Entries shallow-merged into `meta`
    pub meta: Meta,
}

impl NodePatch {
    /// Patch that only replaces content
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Builder: add a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

fn merge_meta(existing: &mut Meta, incoming: &Meta) {
    for (k, v) in incoming {
        existing.insert(k.clone(), v.clone());
    }
}

fn merge_node_into(existing: &mut GraphNode, incoming: &GraphNode) {
    existing.entity_type = incoming.entity_type;
    existing.title = incoming.title.clone();
    if incoming.content.is_some() {
        existing.content = incoming.content.clone();
    }
    if incoming.source.is_some() {
        existing.source = incoming.source.clone();
    }
    merge_meta(&mut existing.meta, &incoming.meta);
}

fn merge_edge_into(existing: &mut GraphEdge, incoming: &GraphEdge) {
    if incoming.id.is_some() {
        existing.id = incoming.id.clone();
    }
    if incoming.evidence.is_some() {
        existing.evidence = incoming.evidence.clone();
    }
    merge_meta(&mut existing.meta, &incoming.meta);
}

/// The mutable, mergeable knowledge graph
///
/// Insertion order is preserved for both nodes and edges, which keeps
/// snapshots and exports deterministic.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<GraphNode>,
    node_index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    edge_index: HashMap<EdgeKey, usize>,
}

impl GraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a normalized copy of `graph`
    pub fn from_graph(graph: Graph) -> Self {
        let mut store = Self::new();
        store.merge(graph.nodes, graph.edges);
        store
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Whether a node id is present
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Create-or-patch a batch of nodes and edges
    pub fn merge(&mut self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> MergeStats {
        let mut stats = MergeStats::default();

        for node in nodes {
            match self.node_index.get(&node.id) {
                Some(&i) => {
                    merge_node_into(&mut self.nodes[i], &node);
                    stats.nodes_updated += 1;
                }
                None => {
                    self.node_index.insert(node.id.clone(), self.nodes.len());
                    self.nodes.push(node);
                    stats.nodes_added += 1;
                }
            }
        }

        for edge in edges {
            if edge.is_self_loop() {
                stats.self_loops_rejected += 1;
                continue;
            }
            let key = edge.key();
            match self.edge_index.get(&key) {
                Some(&i) => {
                    merge_edge_into(&mut self.edges[i], &edge);
                    stats.edges_updated += 1;
                }
                None => {
                    self.edge_index.insert(key, self.edges.len());
                    self.edges.push(edge);
                    stats.edges_added += 1;
                }
            }
        }

        debug!(
            nodes_added = stats.nodes_added,
            nodes_updated = stats.nodes_updated,
            edges_added = stats.edges_added,
            edges_updated = stats.edges_updated,
            "Merged batch into graph store"
        );
        stats
    }

    /// Patch one existing node; returns `false` if the id is unknown
    pub fn update_node(&mut self, id: &str, patch: &NodePatch) -> bool {
        let Some(&i) = self.node_index.get(id) else {
            return false;
        };
        let node = &mut self.nodes[i];
        if let Some(t) = patch.entity_type {
            node.entity_type = t;
        }
        if let Some(title) = &patch.title {
            node.title = title.clone();
        }
        if let Some(content) = &patch.content {
            node.content = Some(content.clone());
        }
        if let Some(source) = &patch.source {
            node.source = Some(source.clone());
        }
        merge_meta(&mut node.meta, &patch.meta);
        true
    }

    /// Patch many nodes; returns the number actually updated
    pub fn update_nodes<'a, I>(&mut self, patches: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a NodePatch)>,
    {
        patches
            .into_iter()
            .filter(|(id, patch)| self.update_node(id, patch))
            .count()
    }

    /// Remove nodes by id together with every edge touching them
    ///
    /// Returns the number of edges dropped.
    pub fn remove_nodes(&mut self, ids: &HashSet<String>) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let before = self.edges.len();
        let nodes = std::mem::take(&mut self.nodes);
        let edges = std::mem::take(&mut self.edges);
        self.nodes = nodes.into_iter().filter(|n| !ids.contains(&n.id)).collect();
        self.edges = edges
            .into_iter()
            .filter(|e| !ids.contains(&e.source) && !ids.contains(&e.target))
            .collect();
        self.reindex();
        before - self.edges.len()
    }

    /// Replace the whole contents (used after namespace freezing)
    pub fn replace(&mut self, graph: Graph) {
        *self = Self::from_graph(graph);
    }

    /// Remove everything
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Immutable copy of the current contents
    pub fn snapshot(&self) -> Graph {
        Graph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Consume the store, returning its contents
    pub fn into_graph(self) -> Graph {
        Graph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }

    /// `latexLabel -> node id` table for every labeled node
    pub fn label_index(&self) -> HashMap<String, String> {
        self.nodes
            .iter()
            .filter_map(|n| n.latex_label().map(|l| (l.to_string(), n.id.clone())))
            .collect()
    }

    fn reindex(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.edge_index = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key(), i))
            .collect();
    }
}

/// Pure merge of `incoming` onto `existing`
pub fn merge_graph(existing: &Graph, incoming: &Graph) -> Graph {
    let mut store = GraphStore::from_graph(existing.clone());
    store.merge(incoming.nodes.clone(), incoming.edges.clone());
    store.into_graph()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use texkg_domain::RelationType;

    fn node(id: &str) -> GraphNode {
        GraphNode::new(id, EntityType::Definition, id.to_uppercase())
    }

    #[test]
    fn test_merge_adds_and_updates() {
        let mut store = GraphStore::new();
        let stats = store.merge(vec![node("a"), node("b")], vec![]);
        assert_eq!(stats.nodes_added, 2);

        let patched = GraphNode::new("a", EntityType::Theorem, "A2");
        let stats = store.merge(vec![patched], vec![]);
        assert_eq!(stats.nodes_updated, 1);
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.node("a").unwrap().entity_type, EntityType::Theorem);
        assert_eq!(store.node("a").unwrap().title, "A2");
    }

    #[test]
    fn test_absent_content_keeps_existing() {
        let mut store = GraphStore::new();
        store.merge(vec![node("a").with_content("x = 1")], vec![]);
        store.merge(vec![node("a")], vec![]);
        assert_eq!(store.node("a").unwrap().content.as_deref(), Some("x = 1"));
    }

    #[test]
    fn test_meta_is_shallow_merged() {
        let mut store = GraphStore::new();
        store.merge(
            vec![node("a").with_meta("k1", json!(1)).with_meta("k2", json!(2))],
            vec![],
        );
        store.merge(vec![node("a").with_meta("k2", json!(20))], vec![]);
        let meta = &store.node("a").unwrap().meta;
        assert_eq!(meta["k1"], json!(1));
        assert_eq!(meta["k2"], json!(20));
    }

    #[test]
    fn test_self_loops_rejected() {
        let mut store = GraphStore::new();
        let stats = store.merge(
            vec![node("a")],
            vec![GraphEdge::new(RelationType::Uses, "a", "a")],
        );
        assert_eq!(stats.self_loops_rejected, 1);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_edges_dedup_by_key() {
        let mut store = GraphStore::new();
        let e = GraphEdge::new(RelationType::DependsOn, "a", "b").with_chunk_id("c0");
        store.merge(vec![], vec![e.clone(), e.clone().with_evidence("reference: b")]);
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.edges()[0].evidence.as_deref(), Some("reference: b"));

        store.merge(vec![], vec![GraphEdge::new(RelationType::DependsOn, "a", "b").with_chunk_id("c1")]);
        assert_eq!(store.edge_count(), 2);
    }

    #[test]
    fn test_update_node_preserves_original_content() {
        let mut store = GraphStore::new();
        store.merge(vec![node("a").with_content("broken")], vec![]);

        let patch = NodePatch::content("repaired").with_meta("originalContent", json!("broken"));
        assert!(store.update_node("a", &patch));
        assert!(!store.update_node("missing", &patch));

        let a = store.node("a").unwrap();
        assert_eq!(a.content.as_deref(), Some("repaired"));
        assert_eq!(a.meta["originalContent"], json!("broken"));
    }

    #[test]
    fn test_update_nodes_counts_hits() {
        let mut store = GraphStore::new();
        store.merge(vec![node("a"), node("b")], vec![]);
        let patch = NodePatch {
            title: Some("T".to_string()),
            ..Default::default()
        };
        let n = store.update_nodes([("a", &patch), ("zzz", &patch), ("b", &patch)]);
        assert_eq!(n, 2);
    }

    #[test]
    fn test_remove_nodes_drops_dangling_edges() {
        let mut store = GraphStore::new();
        store.merge(
            vec![node("a"), node("b"), node("c")],
            vec![
                GraphEdge::new(RelationType::Uses, "a", "b"),
                GraphEdge::new(RelationType::Uses, "b", "c"),
                GraphEdge::new(RelationType::Uses, "a", "c"),
            ],
        );
        let ids: HashSet<String> = ["b".to_string()].into_iter().collect();
        assert_eq!(store.remove_nodes(&ids), 2);
        assert_eq!(store.node_count(), 2);
        assert!(store.node("c").is_some());
        assert_eq!(store.edge_count(), 1);

        // indices survive removal
        store.merge(vec![node("c").with_content("after")], vec![]);
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn test_label_index() {
        let mut store = GraphStore::new();
        let labeled = node("tex:x").with_source(NodeSource {
            file: "a.tex".to_string(),
            latex_label: Some("def:x".to_string()),
            section_path: None,
        });
        store.merge(vec![labeled, node("other")], vec![]);
        let labels = store.label_index();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels["def:x"], "tex:x");
    }
}
