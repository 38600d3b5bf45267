//! Local fact-checking of oracle candidates

use crate::completion::ContentCompleter;
use crate::heuristic::{dedup_edges, dedup_nodes};
use crate::parser::ParsedResponse;
use std::collections::{BTreeSet, HashMap, HashSet};
use texkg_domain::graph::LABEL_ID_PREFIX;
use texkg_domain::{assign_label_id, label_stem, ExtractionResult, GraphNode, LatexChunk, NodeSource, SchemaSelection};
use texkg_gatekeeper::patterns::labels_in;
use texkg_gatekeeper::Gatekeeper;
use tracing::{debug, warn};

/// Label ids shared by one oracle batch
///
/// Seeded with the labels already in the graph, so a label keeps the id it
/// was given by earlier chunks and a new label never takes an id another
/// label owns.
struct LabelTable {
    ids: HashMap<String, String>,
    chunk_labels: Vec<String>,
}

impl LabelTable {
    fn new(known: &HashMap<String, String>, chunk_text: &str) -> Self {
        Self {
            ids: known.clone(),
            chunk_labels: labels_in(chunk_text),
        }
    }

    fn assign(&mut self, label: &str) -> String {
        assign_label_id(label, &mut self.ids)
    }

    /// Label a `tex:` id stands for, when it can be told
    ///
    /// An id owned by a known label resolves to that label. Otherwise the
    /// rest of the id is matched against known and chunk labels, verbatim
    /// first, then by stem when exactly one label has that stem. A rest that
    /// is itself a `kind:name` label is taken as one.
    fn label_for(&self, id: &str) -> Option<String> {
        let rest = id.strip_prefix(LABEL_ID_PREFIX).filter(|r| !r.is_empty())?;
        if let Some((label, _)) = self.ids.iter().find(|(_, owned)| *owned == id) {
            return Some(label.clone());
        }

        let candidates: BTreeSet<&str> = self
            .ids
            .keys()
            .chain(self.chunk_labels.iter())
            .map(String::as_str)
            .collect();
        if candidates.contains(rest) {
            return Some(rest.to_string());
        }
        let mut by_stem = candidates.into_iter().filter(|l| label_stem(l) == rest);
        match (by_stem.next(), by_stem.next()) {
            (Some(label), None) => Some(label.to_string()),
            (None, _) if rest.contains(':') => Some(rest.to_string()),
            _ => None,
        }
    }

    /// Canonical id for an edge endpoint
    fn resolve_ref(&mut self, id: &str) -> String {
        match self.label_for(id) {
            Some(label) => self.assign(&label),
            None => id.to_string(),
        }
    }

    fn in_chunk(&self, label: &str) -> bool {
        self.chunk_labels.iter().any(|l| l == label)
    }
}

fn rename(node: &mut GraphNode, id: String, renamed: &mut HashMap<String, String>) {
    if id != node.id {
        renamed.insert(std::mem::replace(&mut node.id, id.clone()), id);
    }
}

fn fill_source(node: &mut GraphNode, chunk: &LatexChunk) {
    let source = node.source.get_or_insert_with(NodeSource::default);
    if source.file.trim().is_empty() {
        source.file = chunk.file.clone();
    }
    if source.section_path.as_ref().is_none_or(|p| p.is_empty()) {
        source.section_path = Some(chunk.section_path.clone());
    }
}

/// Turn parsed oracle output into a grounded extraction result
///
/// Ids are canonicalized against `known_labels` (label to node id in the
/// graph so far), out-of-vocabulary entries and entries failing the shared
/// validity policy are dropped with warnings, content is completed from the
/// chunk, and edges touching a dropped node are discarded. Malformed entries
/// are dropped without a warning.
pub fn ground_candidates(
    parsed: ParsedResponse,
    chunk: &LatexChunk,
    vocabulary: &SchemaSelection,
    gatekeeper: &Gatekeeper,
    completer: &ContentCompleter,
    known_labels: &HashMap<String, String>,
) -> ExtractionResult {
    let mut warnings = Vec::new();
    let malformed = parsed.dropped_nodes + parsed.dropped_edges;
    if malformed > 0 {
        debug!("Dropped {} malformed oracle entries in {}", malformed, chunk.id);
    }

    // 1. Canonical ids: explicit labels claim ids before bare `tex:` ids
    let mut table = LabelTable::new(known_labels, &chunk.text);
    let mut renamed: HashMap<String, String> = HashMap::new();
    let mut nodes = parsed.nodes;
    for node in nodes.iter_mut() {
        if let Some(label) = node.latex_label().map(str::to_string) {
            let id = table.assign(&label);
            rename(node, id, &mut renamed);
        }
    }
    for node in nodes.iter_mut().filter(|n| n.latex_label().is_none()) {
        let Some(label) = table.label_for(&node.id) else {
            continue;
        };
        if table.in_chunk(&label) {
            node.source.get_or_insert_with(NodeSource::default).latex_label = Some(label.clone());
        }
        let id = table.assign(&label);
        rename(node, id, &mut renamed);
    }

    // 2. Vocabulary
    let mut dropped: HashSet<String> = HashSet::new();
    nodes.retain(|node| {
        if vocabulary.allows_entity(node.entity_type) {
            true
        } else {
            warnings.push(format!(
                "Dropped {}: type {} is not in the selected vocabulary",
                node.id, node.entity_type
            ));
            dropped.insert(node.id.clone());
            false
        }
    });

    // 3. Provenance and completion
    for node in nodes.iter_mut() {
        fill_source(node, chunk);
    }
    completer.complete(&mut nodes, &chunk.text);

    // 4. Shared validity policy
    let (nodes, rejected) = gatekeeper.filter_candidates(nodes, &chunk.text);
    for reason in rejected {
        warn!("{}", reason);
        dropped.insert(reason.node_id().to_string());
        warnings.push(reason.to_string());
    }
    // A node rejected under one id may survive under another duplicate entry
    let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    dropped.retain(|id| !kept.contains(id.as_str()));

    // 5. Edges
    let mut orphaned = 0;
    let mut off_vocabulary = 0;
    let mut edges = Vec::with_capacity(parsed.edges.len());
    for mut edge in parsed.edges {
        for end in [&mut edge.source, &mut edge.target] {
            let id = match renamed.get(end.as_str()) {
                Some(id) => id.clone(),
                None => table.resolve_ref(end),
            };
            *end = id;
        }
        if edge.is_self_loop() {
            continue;
        }
        if !vocabulary.allows_relation(edge.relation_type) {
            off_vocabulary += 1;
            continue;
        }
        if dropped.contains(&edge.source) || dropped.contains(&edge.target) {
            orphaned += 1;
            continue;
        }
        if edge.chunk_id().is_none() {
            edge = edge.with_chunk_id(chunk.id.as_str());
        }
        edges.push(edge);
    }
    if off_vocabulary > 0 {
        warnings.push(format!(
            "Dropped {} edges with relation types outside the selected vocabulary",
            off_vocabulary
        ));
    }
    if orphaned > 0 {
        warnings.push(format!("Dropped {} edges referencing rejected nodes", orphaned));
    }

    ExtractionResult {
        nodes: dedup_nodes(nodes),
        edges: dedup_edges(edges),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_oracle_response;
    use texkg_domain::{EntityType, RelationType};

    fn chunk(text: &str) -> LatexChunk {
        LatexChunk {
            id: "chunk:a.tex:0".to_string(),
            file: "a.tex".to_string(),
            title: "S".to_string(),
            section_path: vec!["a.tex".to_string(), "S".to_string()],
            text: text.to_string(),
        }
    }

    fn ground(response: &str, text: &str, vocabulary: &SchemaSelection) -> ExtractionResult {
        ground_with_labels(response, text, vocabulary, &HashMap::new())
    }

    fn ground_with_labels(
        response: &str,
        text: &str,
        vocabulary: &SchemaSelection,
        known: &HashMap<String, String>,
    ) -> ExtractionResult {
        let parsed = parse_oracle_response(response).unwrap();
        ground_candidates(
            parsed,
            &chunk(text),
            vocabulary,
            &Gatekeeper::default_config(),
            &ContentCompleter::default(),
            known,
        )
    }

    #[test]
    fn test_label_ids_are_canonical() {
        let response = r#"{
            "nodes": [
                {"id": "n1", "type": "Definition", "title": "Ring",
                 "content": "A ring is a set with two operations satisfying the axioms.",
                 "source": {"latexLabel": "def:ring"}}
            ],
            "edges": [
                {"type": "DependsOn", "source": "tex:thm:main", "target": "n1"}
            ]
        }"#;
        let result = ground(response, "text", &SchemaSelection::default());
        assert_eq!(result.nodes[0].id, "tex:ring");
        let source = result.nodes[0].source.as_ref().unwrap();
        assert_eq!(source.file, "a.tex");
        assert_eq!(source.section_path.as_deref(), Some(&["a.tex".to_string(), "S".to_string()][..]));
        assert_eq!(result.edges[0].source, "tex:main");
        assert_eq!(result.edges[0].target, "tex:ring");
        assert_eq!(result.edges[0].chunk_id(), Some("chunk:a.tex:0"));
    }

    #[test]
    fn test_rejected_formula_drops_its_edges() {
        let response = r#"{
            "nodes": [
                {"id": "f1", "type": "Formula", "title": "Count", "content": "the number of lessons grows"},
                {"id": "t1", "type": "Theorem", "title": "Main", "content": "Every bounded sequence has a convergent subsequence."}
            ],
            "edges": [
                {"type": "Uses", "source": "t1", "target": "f1"}
            ]
        }"#;
        let result = ground(response, "Every bounded sequence has a convergent subsequence.", &SchemaSelection::default());
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].id, "t1");
        assert!(result.edges.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains("f1")));
        assert!(result.warnings.iter().any(|w| w.contains("1 edges referencing rejected nodes")));
    }

    #[test]
    fn test_vocabulary_filter() {
        let vocabulary = SchemaSelection {
            entity_types: vec![EntityType::Definition, EntityType::Notation],
            relation_types: vec![RelationType::EquivalentTo],
            notes: None,
        };
        let response = r#"{
            "nodes": [
                {"id": "d1", "type": "Definition", "title": "Ring", "content": "A ring is a set with two operations."},
                {"id": "t1", "type": "Theorem", "title": "Main", "content": "Something long enough to be kept."}
            ],
            "edges": [
                {"type": "DependsOn", "source": "d1", "target": "x"}
            ]
        }"#;
        let result = ground(response, "", &vocabulary);
        assert_eq!(result.nodes.len(), 1);
        assert!(result.edges.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains("t1") && w.contains("Theorem")));
    }

    #[test]
    fn test_malformed_entries_dropped_silently() {
        let response = r#"{"nodes": [{"id": "x"}], "edges": []}"#;
        let result = ground(response, "", &SchemaSelection::default());
        assert!(result.nodes.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_shared_stem_gets_its_own_id() {
        let known = HashMap::from([("thm:pyth".to_string(), "tex:pyth".to_string())]);
        let response = r#"{
            "nodes": [
                {"id": "tex:pyth", "type": "Formula", "title": "Formula (eq:pyth)",
                 "content": "a^2 + b^2 = c^2", "source": {"latexLabel": "eq:pyth"}}
            ],
            "edges": [
                {"type": "DependsOn", "source": "tex:pyth", "target": "tex:thm:pyth"}
            ]
        }"#;
        let text = r"\begin{equation}\label{eq:pyth} a^2 + b^2 = c^2 \end{equation}";
        let result = ground_with_labels(response, text, &SchemaSelection::default(), &known);
        assert_eq!(result.nodes[0].id, "tex:eq:pyth");
        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.edges[0].source, "tex:eq:pyth");
        assert_eq!(result.edges[0].target, "tex:pyth");
    }

    #[test]
    fn test_bare_id_picks_up_chunk_label() {
        let response = r#"{
            "nodes": [
                {"id": "tex:ring", "type": "Definition", "title": "Ring", "content": "A ring is ..."}
            ],
            "edges": []
        }"#;
        let text = r"\begin{definition}\label{def:ring} A ring is a set $R$ with two operations $+$ and $\cdot$.\end{definition}";
        let result = ground(response, text, &SchemaSelection::default());
        assert_eq!(result.nodes[0].id, "tex:ring");
        assert_eq!(result.nodes[0].latex_label(), Some("def:ring"));
        assert!(result.nodes[0].content_str().contains("with two operations"));
    }
}
