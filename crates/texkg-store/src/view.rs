//! Display-oriented graph filtering

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use texkg_domain::{EntityType, Graph, GraphEdge};

/// Which node groups to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFilters {
    /// Keep Example nodes
    pub show_examples: bool,
    /// Keep Exercise nodes
    pub show_exercises: bool,
    /// Keep nodes without any edge
    pub show_isolated: bool,
}

impl Default for ViewFilters {
    fn default() -> Self {
        Self {
            show_examples: true,
            show_exercises: true,
            show_isolated: true,
        }
    }
}

fn retain_edges(edges: Vec<GraphEdge>, keep: &HashSet<String>) -> Vec<GraphEdge> {
    edges
        .into_iter()
        .filter(|e| keep.contains(&e.source) && keep.contains(&e.target))
        .collect()
}

/// Hide node groups, dropping edges that lose an endpoint
///
/// Isolation is judged after the type filter, so a node only linked to
/// hidden examples is itself treated as isolated.
pub fn filter_graph_view(graph: &Graph, view: ViewFilters) -> Graph {
    let mut nodes = graph.nodes.clone();
    let mut edges = graph.edges.clone();

    let mut hidden = Vec::new();
    if !view.show_examples {
        hidden.push(EntityType::Example);
    }
    if !view.show_exercises {
        hidden.push(EntityType::Exercise);
    }

    if !hidden.is_empty() {
        nodes.retain(|n| !hidden.contains(&n.entity_type));
        let keep: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
        edges = retain_edges(edges, &keep);
    }

    if !view.show_isolated {
        let mut degree: HashMap<&str, usize> = HashMap::new();
        for e in &edges {
            *degree.entry(e.source.as_str()).or_default() += 1;
            *degree.entry(e.target.as_str()).or_default() += 1;
        }
        let keep: HashSet<String> = nodes
            .iter()
            .filter(|n| degree.get(n.id.as_str()).copied().unwrap_or(0) > 0)
            .map(|n| n.id.clone())
            .collect();
        nodes.retain(|n| keep.contains(&n.id));
        edges = retain_edges(edges, &keep);
    }

    Graph { nodes, edges }
}
