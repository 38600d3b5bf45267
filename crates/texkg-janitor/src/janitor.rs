//! Core Janitor implementation: pruning noisy formula nodes

use crate::{JanitorConfig, JanitorError, PruneStats};
use std::collections::HashSet;
use texkg_domain::{EntityType, Graph, GraphNode};
use texkg_gatekeeper::is_labeled;
use texkg_gatekeeper::patterns::{looks_like_template_formula, looks_problem_indexed};
use texkg_store::GraphStore;
use tracing::{debug, info};

/// Janitor service for graph cleanliness
///
/// Only unlabeled `Formula` nodes that take part in no important relation
/// are candidates. A candidate is dropped when it looks like a generic
/// template, looks exercise-local, or is shorter than the configured
/// minimum. Edges left dangling are dropped and counted.
///
/// # Examples
///
/// ```
/// use texkg_domain::{EntityType, Graph, GraphNode};
/// use texkg_janitor::Janitor;
///
/// let graph = Graph {
///     nodes: vec![GraphNode::new("f", EntityType::Formula, "Step").with_content("x + 1 = 2")],
///     edges: vec![],
/// };
/// let (pruned, stats) = Janitor::default_config().prune(&graph);
/// assert!(pruned.nodes.is_empty());
/// assert_eq!(stats.dropped_node_ids, vec!["f".to_string()]);
/// ```
pub struct Janitor {
    config: JanitorConfig,
}

impl Janitor {
    /// Create a new Janitor with the given configuration
    pub fn new(config: JanitorConfig) -> Self {
        Self { config }
    }

    /// Create a Janitor after validating its configuration
    pub fn try_new(config: JanitorConfig) -> Result<Self, JanitorError> {
        config.validate().map_err(JanitorError::Config)?;
        Ok(Self::new(config))
    }

    /// Create a Janitor with default configuration
    pub fn default_config() -> Self {
        Self::new(JanitorConfig::default())
    }

    /// Current configuration
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Prune a graph, returning the cleaned graph and what was removed
    ///
    /// In dry-run mode the input is returned unchanged while the stats still
    /// describe what would have been removed.
    pub fn prune(&self, graph: &Graph) -> (Graph, PruneStats) {
        let important: HashSet<&str> = graph
            .edges
            .iter()
            .filter(|e| e.relation_type.is_important())
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();

        let mut stats = PruneStats::default();
        let mut kept: Vec<GraphNode> = Vec::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            if node.entity_type == EntityType::Formula {
                stats.candidates += 1;
            }
            if self.should_drop(node, &important) {
                debug!("Pruning formula {} ({})", node.id, node.title);
                stats.dropped_node_ids.push(node.id.clone());
            } else {
                kept.push(node.clone());
            }
        }

        let kept_ids: HashSet<&str> = kept.iter().map(|n| n.id.as_str()).collect();
        let edges: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| kept_ids.contains(e.source.as_str()) && kept_ids.contains(e.target.as_str()))
            .cloned()
            .collect();
        stats.dropped_edge_count = graph.edges.len() - edges.len();

        if self.config.dry_run {
            info!(
                "DRY RUN: Would drop {} nodes and {} edges",
                stats.dropped_node_count(),
                stats.dropped_edge_count
            );
            return (graph.clone(), stats);
        }

        info!(
            "Pruned {} nodes and {} edges ({} formula candidates)",
            stats.dropped_node_count(),
            stats.dropped_edge_count,
            stats.candidates
        );
        (Graph { nodes: kept, edges }, stats)
    }

    /// Prune a live store in place
    pub fn prune_store(&self, store: &mut GraphStore) -> PruneStats {
        let (pruned, stats) = self.prune(&store.snapshot());
        if !self.config.dry_run && !stats.is_noop() {
            store.replace(pruned);
        }
        stats
    }

    fn should_drop(&self, node: &GraphNode, important: &HashSet<&str>) -> bool {
        if node.entity_type != EntityType::Formula || is_labeled(node) {
            return false;
        }
        if important.contains(node.id.as_str()) {
            return false;
        }

        let title = node.title.trim();
        let content = node.content_str().trim();

        if self.config.drop_templates && (looks_like_template_formula(content) || looks_like_template_formula(title)) {
            return true;
        }
        if self.config.drop_problem_indexed && (looks_problem_indexed(content) || looks_problem_indexed(title)) {
            return true;
        }
        content.chars().count() < self.config.min_formula_content_len
    }
}
