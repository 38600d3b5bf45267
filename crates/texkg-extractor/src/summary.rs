//! Compact graph views handed to the oracle

use crate::heuristic::references;
use std::collections::HashSet;
use texkg_domain::{Graph, GraphNode, LatexChunk};

const TITLE_LIMIT: usize = 80;
const MIN_KEYWORD_LEN: usize = 4;
const MAX_KEYWORD_HITS: usize = 5;

fn truncate_title(s: &str, n: usize) -> String {
    if s.chars().count() <= n {
        return s.to_string();
    }
    let mut out: String = s.chars().take(n.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn node_line(node: &GraphNode) -> String {
    let label = node
        .latex_label()
        .map(|l| format!(" label={}", l))
        .unwrap_or_default();
    format!(
        "- {} | {} | {}{}",
        node.id,
        node.entity_type,
        truncate_title(&node.title, TITLE_LIMIT),
        label
    )
}

fn keywords(s: &str) -> HashSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

/// Relevance of a node to a chunk
///
/// Label references weigh most, then an identical section path, then shared
/// title keywords.
fn relevance(node: &GraphNode, chunk: &LatexChunk, refs: &HashSet<String>, words: &HashSet<String>) -> usize {
    let mut score = 0;
    if let Some(label) = node.latex_label() {
        if refs.contains(label) || chunk.text.contains(&format!("{{{}}}", label)) {
            score += 10;
        }
    }
    if let Some(path) = node.source.as_ref().and_then(|s| s.section_path.as_ref()) {
        if *path == chunk.section_path {
            score += 3;
        } else if path.len() > 1 && chunk.section_path.len() > 1 && path[..2] == chunk.section_path[..2] {
            score += 1;
        }
    }
    let hits = keywords(&node.title).intersection(words).count();
    score + hits.min(MAX_KEYWORD_HITS)
}

/// Indices of the nodes most relevant to `chunk`, backfilled in insertion order
fn select_nodes(graph: &Graph, chunk: &LatexChunk, max_nodes: usize) -> Vec<usize> {
    let refs: HashSet<String> = references(&chunk.text).into_iter().collect();
    let words = keywords(&chunk.text);

    let mut scored: Vec<(usize, usize)> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (relevance(n, chunk, &refs, &words), i))
        .filter(|&(score, _)| score > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut picked: Vec<usize> = scored.into_iter().take(max_nodes).map(|(_, i)| i).collect();
    if picked.len() < max_nodes {
        let taken: HashSet<usize> = picked.iter().copied().collect();
        let room = max_nodes - picked.len();
        picked.extend((0..graph.nodes.len()).filter(|i| !taken.contains(i)).take(room));
    }
    picked
}

/// Retrieval-style summary of `graph` for extracting `chunk`
pub fn summarize_graph(graph: &Graph, chunk: &LatexChunk, max_nodes: usize, max_edges: usize) -> String {
    let picked = select_nodes(graph, chunk, max_nodes);
    let ids: HashSet<&str> = picked.iter().map(|&i| graph.nodes[i].id.as_str()).collect();

    let mut lines = Vec::with_capacity(picked.len() + max_edges + 3);
    lines.push(format!("nodes({}) showing {}:", graph.nodes.len(), picked.len()));
    lines.extend(picked.iter().map(|&i| node_line(&graph.nodes[i])));

    // Edges among shown nodes first, then edges touching one shown node
    let both = graph
        .edges
        .iter()
        .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()));
    let one = graph
        .edges
        .iter()
        .filter(|e| ids.contains(e.source.as_str()) != ids.contains(e.target.as_str()));
    let edges: Vec<String> = both
        .chain(one)
        .take(max_edges)
        .map(|e| format!("- ({}) {} -> {}", e.relation_type, e.source, e.target))
        .collect();

    lines.push(String::new());
    lines.push(format!("edges({}) showing {}:", graph.edges.len(), edges.len()));
    lines.extend(edges);
    lines.join("\n").trim().to_string()
}

/// Listing of base-concept nodes whose ids must be reused
pub fn concept_registry(graph: &Graph, max_entries: usize) -> String {
    graph
        .nodes
        .iter()
        .filter(|n| n.entity_type.is_base_concept())
        .take(max_entries)
        .map(node_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use texkg_domain::{EntityType, GraphEdge, NodeSource, RelationType};

    fn chunk(text: &str) -> LatexChunk {
        LatexChunk {
            id: "c9".to_string(),
            file: "b.tex".to_string(),
            title: "Groups".to_string(),
            section_path: vec!["b.tex".to_string(), "Groups".to_string()],
            text: text.to_string(),
        }
    }

    fn labeled(id: &str, title: &str, label: &str) -> GraphNode {
        GraphNode::new(id, EntityType::Definition, title).with_source(NodeSource {
            file: "a.tex".to_string(),
            latex_label: Some(label.to_string()),
            section_path: None,
        })
    }

    #[test]
    fn test_summary_format() {
        let graph = Graph {
            nodes: vec![
                labeled("tex:x", "Ring", "def:x"),
                GraphNode::new("n2", EntityType::Theorem, "Main"),
            ],
            edges: vec![GraphEdge::new(RelationType::DependsOn, "n2", "tex:x")],
        };
        let s = summarize_graph(&graph, &chunk("nothing"), 160, 80);
        assert_eq!(
            s,
            "nodes(2) showing 2:\n- tex:x | Definition | Ring label=def:x\n- n2 | Theorem | Main\n\nedges(1) showing 1:\n- (DependsOn) n2 -> tex:x"
        );
    }

    #[test]
    fn test_referenced_label_ranks_first() {
        let mut nodes: Vec<GraphNode> = (0..5)
            .map(|i| GraphNode::new(format!("n{}", i), EntityType::Lemma, format!("L{}", i)))
            .collect();
        nodes.push(labeled("tex:late", "Late", "def:late"));
        let graph = Graph { nodes, edges: vec![] };
        let s = summarize_graph(&graph, &chunk(r"see \ref{def:late}"), 2, 10);
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "nodes(6) showing 2:");
        assert!(lines[1].starts_with("- tex:late"));
        assert!(lines[2].starts_with("- n0"));
    }

    #[test]
    fn test_title_truncated() {
        let long = "x".repeat(100);
        let graph = Graph {
            nodes: vec![GraphNode::new("n", EntityType::Lemma, long)],
            edges: vec![],
        };
        let s = summarize_graph(&graph, &chunk(""), 10, 10);
        let line = s.lines().nth(1).unwrap();
        assert!(line.ends_with('…'));
        assert_eq!(line.chars().count(), "- n | Lemma | ".len() + 80);
    }

    #[test]
    fn test_registry_lists_base_concepts_only() {
        let graph = Graph {
            nodes: vec![
                labeled("tex:x", "Ring", "def:x"),
                GraphNode::new("t", EntityType::Theorem, "Main"),
                GraphNode::new("n", EntityType::Notation, "Bracket"),
            ],
            edges: vec![],
        };
        assert_eq!(
            concept_registry(&graph, 10),
            "- tex:x | Definition | Ring label=def:x\n- n | Notation | Bracket"
        );
    }
}
