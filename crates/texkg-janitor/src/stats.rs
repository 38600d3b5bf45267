//! Pruning statistics

use serde::{Deserialize, Serialize};

/// Outcome of one pruning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneStats {
    /// Ids of removed nodes, in graph order
    pub dropped_node_ids: Vec<String>,

    /// Edges removed because an endpoint was removed or missing
    pub dropped_edge_count: usize,

    /// Formula nodes that were considered at all
    #[serde(default)]
    pub candidates: usize,
}

impl PruneStats {
    /// Number of removed nodes
    pub fn dropped_node_count(&self) -> usize {
        self.dropped_node_ids.len()
    }

    /// Whether the pass changed nothing
    pub fn is_noop(&self) -> bool {
        self.dropped_node_ids.is_empty() && self.dropped_edge_count == 0
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Prune Summary".to_string(),
            "=============".to_string(),
            format!("Formula candidates: {}", self.candidates),
            format!("Nodes dropped: {}", self.dropped_node_count()),
            format!("Edges dropped: {}", self.dropped_edge_count),
        ];
        if !self.dropped_node_ids.is_empty() {
            lines.push(String::new());
            lines.push("Dropped nodes:".to_string());
            for id in self.dropped_node_ids.iter().take(20) {
                lines.push(format!("  {}", id));
            }
            if self.dropped_node_ids.len() > 20 {
                lines.push(format!("  ... and {} more", self.dropped_node_ids.len() - 20));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_truncates() {
        let stats = PruneStats {
            dropped_node_ids: (0..25).map(|i| format!("n{}", i)).collect(),
            dropped_edge_count: 3,
            candidates: 30,
        };
        let summary = stats.summary();
        assert!(summary.contains("Nodes dropped: 25"));
        assert!(summary.contains("... and 5 more"));
        assert!(!summary.contains("n24"));
    }

    #[test]
    fn test_noop() {
        assert!(PruneStats::default().is_noop());
    }
}
