//! Deterministic extraction from LaTeX structure
//!
//! Theorem-like environments, display math, and `\ref`-style references are
//! recognized syntactically. Nothing here calls out to an oracle, so the same
//! chunk and label table always produce the same result.

use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;
use texkg_domain::{
    assign_label_id, EdgeKey, EntityType, ExtractionResult, GraphEdge, GraphNode, LatexChunk, NodeSource,
    RelationType, SchemaSelection,
};
use texkg_gatekeeper::find_environments;
use texkg_gatekeeper::patterns::{example_spans, first_label, within_spans, SOLUTION_ENVIRONMENTS};

/// Environments that become typed nodes
pub const THEOREM_LIKE_ENVIRONMENTS: [&str; 9] = [
    "theorem",
    "lemma",
    "corollary",
    "definition",
    "axiom",
    "proposition",
    "conclusion",
    "example",
    "exercise",
];

/// Display-math environments, starred forms included
pub const MATH_ENVIRONMENTS: [&str; 8] = [
    "equation",
    "equation*",
    "align",
    "align*",
    "gather",
    "gather*",
    "multline",
    "multline*",
];

static OPTIONAL_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\\begin\{[a-zA-Z*]+\}\s*\[([^\]]+)\]").expect("valid regex"));

static REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(?:eqref|ref|autoref|cref)\{([^}]+)\}").expect("valid regex"));

static DERIVED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)derived\s+from\s+\\ref\{([^}]+)\}").expect("valid regex"));

static DISPLAY_DOLLAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.*?)\$\$").expect("valid regex"));

static DISPLAY_BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]").expect("valid regex"));

/// A node together with the chunk text its references are read from
struct Found {
    node: GraphNode,
    scope: Range<usize>,
}

/// The local, oracle-free extractor
#[derive(Debug, Clone, Default)]
pub struct LocalExtractor;

impl LocalExtractor {
    /// Create a local extractor
    pub fn new() -> Self {
        Self
    }

    /// Extract candidates from one chunk
    ///
    /// `labels` maps LaTeX labels to node ids. It is read to resolve
    /// references and updated with every label defined in this chunk.
    pub fn extract(
        &self,
        chunk: &LatexChunk,
        selection: &SchemaSelection,
        labels: &mut HashMap<String, String>,
    ) -> ExtractionResult {
        let text = chunk.text.as_str();
        let mut found = Vec::new();

        let section_id = format!("sec:{}", chunk.section_path.join(" / "));
        let has_section = selection.allows_entity(EntityType::Conclusion);

        found.extend(extract_environments(chunk, selection, labels));
        if selection.allows_entity(EntityType::Formula) {
            found.extend(extract_formulas(chunk, labels));
        }

        let mut edges = Vec::new();

        if has_section && selection.allows_relation(RelationType::Contains) {
            for f in &found {
                edges.push(
                    GraphEdge::new(RelationType::Contains, section_id.as_str(), f.node.id.as_str())
                        .with_chunk_id(chunk.id.as_str()),
                );
            }
        }

        if selection.allows_relation(RelationType::DependsOn) {
            for f in &found {
                for label in references(&text[f.scope.clone()]) {
                    if let Some(target) = labels.get(&label).filter(|t| **t != f.node.id) {
                        edges.push(
                            GraphEdge::new(RelationType::DependsOn, f.node.id.as_str(), target.as_str())
                                .with_evidence(format!("reference: {}", label))
                                .with_chunk_id(chunk.id.as_str()),
                        );
                    }
                }
            }
        }

        if selection.allows_relation(RelationType::DerivedFrom) {
            for f in &found {
                let scope = &text[f.scope.clone()];
                for caps in DERIVED_RE.captures_iter(scope) {
                    let label = caps[1].trim();
                    if let Some(target) = labels.get(label).filter(|t| **t != f.node.id) {
                        edges.push(
                            GraphEdge::new(RelationType::DerivedFrom, f.node.id.as_str(), target.as_str())
                                .with_evidence(&caps[0])
                                .with_chunk_id(chunk.id.as_str()),
                        );
                    }
                }
            }
        }

        let mut nodes = Vec::with_capacity(found.len() + 1);
        if has_section {
            nodes.push(
                GraphNode::new(section_id.as_str(), EntityType::Conclusion, chunk.display_title())
                    .with_source(NodeSource {
                        file: chunk.file.clone(),
                        latex_label: None,
                        section_path: Some(chunk.section_path.clone()),
                    }),
            );
        }
        nodes.extend(found.into_iter().map(|f| f.node));

        ExtractionResult {
            nodes: dedup_nodes(nodes),
            edges: dedup_edges(edges),
            warnings: Vec::new(),
        }
    }
}

fn extract_environments(
    chunk: &LatexChunk,
    selection: &SchemaSelection,
    labels: &mut HashMap<String, String>,
) -> Vec<Found> {
    let text = chunk.text.as_str();
    let solutions = find_environments(text, &SOLUTION_ENVIRONMENTS);
    let mut out = Vec::new();
    let mut idx = 0;

    for env in find_environments(text, &THEOREM_LIKE_ENVIRONMENTS) {
        let Some(entity_type) = EntityType::from_environment(&env.name) else {
            continue;
        };
        if !selection.allows_entity(entity_type) {
            continue;
        }

        let body = env.body(text);
        let mut scope = env.outer.clone();
        let mut meta: Vec<(String, String)> = Vec::new();
        let mut content = body.to_string();

        if matches!(entity_type, EntityType::Example | EntityType::Exercise) {
            // Nested solution blocks move into meta
            let nested = find_environments(body, &SOLUTION_ENVIRONMENTS);
            if !nested.is_empty() {
                let mut kept = String::with_capacity(body.len());
                let mut last = 0;
                for sol in &nested {
                    kept.push_str(&body[last..sol.outer.start]);
                    meta.push((sol.name.clone(), sol.body(body).trim().to_string()));
                    last = sol.outer.end;
                }
                kept.push_str(&body[last..]);
                content = kept;
            }
            // A solution directly after the block belongs to it
            if let Some(sol) = solutions
                .iter()
                .find(|s| s.outer.start >= env.outer.end && text[env.outer.end..s.outer.start].trim().is_empty())
            {
                meta.push((sol.name.clone(), sol.body(text).trim().to_string()));
                scope.end = sol.outer.end;
            }
        }

        let label = first_label(&without_math_blocks(body));
        let title = OPTIONAL_TITLE_RE
            .captures(env.outer(text))
            .map(|c| c[1].trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{} {}", entity_type, idx + 1));
        let id = match &label {
            Some(l) => assign_label_id(l, labels),
            None => format!("{}:{}:{}", chunk.id, env.name, idx),
        };
        idx += 1;

        let mut node = GraphNode::new(id, entity_type, title)
            .with_content(content.trim())
            .with_source(source_for(chunk, label));
        for (key, value) in meta {
            node = node.with_meta(key, Value::String(value));
        }
        out.push(Found { node, scope });
    }
    out
}

fn extract_formulas(chunk: &LatexChunk, labels: &mut HashMap<String, String>) -> Vec<Found> {
    let text = chunk.text.as_str();
    let examples = example_spans(text);

    // (outer range, body range) in the fixed pattern order
    let mut blocks: Vec<(Range<usize>, Range<usize>)> = Vec::new();
    for name in ["equation", "align"] {
        blocks.extend(find_environments(text, &[name]).into_iter().map(|e| (e.outer, e.body)));
    }
    for re in [&*DISPLAY_DOLLAR_RE, &*DISPLAY_BRACKET_RE] {
        for caps in re.captures_iter(text) {
            if let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) {
                blocks.push((whole.range(), body.range()));
            }
        }
    }

    let mut out = Vec::new();
    let mut idx = 0;
    for (outer, body) in blocks {
        let body_text = text[body].trim();
        if body_text.is_empty() {
            continue;
        }
        let label = first_label(body_text);
        if label.is_none() && within_spans(&examples, outer.start) {
            continue;
        }
        let (id, title) = match &label {
            Some(l) => (assign_label_id(l, labels), format!("Formula ({})", l)),
            None => {
                idx += 1;
                (format!("{}:formula:{}", chunk.id, idx - 1), format!("Formula {}", idx))
            }
        };
        let node = GraphNode::new(id, EntityType::Formula, title)
            .with_content(body_text)
            .with_source(source_for(chunk, label));
        out.push(Found { node, scope: outer });
    }
    out
}

fn source_for(chunk: &LatexChunk, label: Option<String>) -> NodeSource {
    NodeSource {
        file: chunk.file.clone(),
        latex_label: label,
        section_path: Some(chunk.section_path.clone()),
    }
}

/// Body text with nested display-math blocks removed
///
/// Keeps an equation label from being taken as its enclosing theorem's label.
fn without_math_blocks(body: &str) -> String {
    let spans = find_environments(body, &MATH_ENVIRONMENTS);
    if spans.is_empty() {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for span in spans {
        out.push_str(&body[last..span.outer.start]);
        last = span.outer.end;
    }
    out.push_str(&body[last..]);
    out
}

/// Distinct referenced labels in order of first appearance
///
/// `\cref{a,b}` contributes both labels.
pub fn references(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for caps in REF_RE.captures_iter(text) {
        for label in caps[1].split(',') {
            let label = label.trim();
            if !label.is_empty() && seen.insert(label.to_string()) {
                out.push(label.to_string());
            }
        }
    }
    out
}

/// Shallow-merge nodes sharing an id, keeping first-seen order
pub(crate) fn dedup_nodes(nodes: Vec<GraphNode>) -> Vec<GraphNode> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<GraphNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match index.get(&node.id) {
            Some(&i) => {
                let prev = &mut out[i];
                let mut meta = std::mem::take(&mut prev.meta);
                meta.extend(node.meta.clone());
                *prev = GraphNode { meta, ..node };
            }
            None => {
                index.insert(node.id.clone(), out.len());
                out.push(node);
            }
        }
    }
    out
}

/// Collapse edges sharing a dedup key; the last one wins
pub(crate) fn dedup_edges(edges: Vec<GraphEdge>) -> Vec<GraphEdge> {
    let mut index: HashMap<EdgeKey, usize> = HashMap::new();
    let mut out: Vec<GraphEdge> = Vec::with_capacity(edges.len());
    for edge in edges {
        let key = edge.key();
        match index.get(&key) {
            Some(&i) => out[i] = edge,
            None => {
                index.insert(key, out.len());
                out.push(edge);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str) -> LatexChunk {
        LatexChunk {
            id: id.to_string(),
            file: "book.tex".to_string(),
            title: "Intro".to_string(),
            section_path: vec!["book.tex".to_string(), "Intro".to_string()],
            text: text.to_string(),
        }
    }

    #[test]
    fn test_labeled_environment() {
        let c = chunk("c0", r"\begin{definition}[Group]\label{def:group} A set with an operation.\end{definition}");
        let mut labels = HashMap::new();
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut labels);

        let node = result.nodes.iter().find(|n| n.id == "tex:group").unwrap();
        assert_eq!(node.entity_type, EntityType::Definition);
        assert_eq!(node.title, "Group");
        assert_eq!(node.latex_label(), Some("def:group"));
        assert_eq!(labels.get("def:group").map(String::as_str), Some("tex:group"));
    }

    #[test]
    fn test_section_node_and_contains() {
        let c = chunk("c0", r"\begin{lemma}Easy.\end{lemma}");
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut HashMap::new());

        assert_eq!(result.nodes[0].id, "sec:book.tex / Intro");
        assert_eq!(result.nodes[0].entity_type, EntityType::Conclusion);
        assert_eq!(result.nodes[1].id, "c0:lemma:0");
        assert_eq!(result.nodes[1].title, "Lemma 1");
        let contains: Vec<_> = result
            .edges
            .iter()
            .filter(|e| e.relation_type == RelationType::Contains)
            .collect();
        assert_eq!(contains.len(), 1);
        assert_eq!(contains[0].chunk_id(), Some("c0"));
    }

    #[test]
    fn test_no_section_node_without_conclusion() {
        let selection = SchemaSelection {
            entity_types: vec![EntityType::Lemma],
            ..Default::default()
        };
        let c = chunk("c0", r"\begin{lemma}Easy.\end{lemma}");
        let result = LocalExtractor::new().extract(&c, &selection, &mut HashMap::new());
        assert_eq!(result.nodes.len(), 1);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn test_formula_numbering() {
        let c = chunk("c0", "\\[ a = b \\]\n\\begin{equation}\\label{eq:e} E = mc^2 \\end{equation}\n$$ x^2 $$\n\\[  \\]");
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut HashMap::new());
        let formulas: Vec<_> = result
            .nodes
            .iter()
            .filter(|n| n.entity_type == EntityType::Formula)
            .map(|n| (n.id.as_str(), n.title.as_str()))
            .collect();
        assert_eq!(
            formulas,
            vec![
                ("tex:e", "Formula (eq:e)"),
                ("c0:formula:0", "Formula 1"),
                ("c0:formula:1", "Formula 2"),
            ]
        );
    }

    #[test]
    fn test_theorem_label_ignores_nested_equation_label() {
        let c = chunk(
            "c0",
            r"\begin{theorem}\begin{equation}\label{eq:inner} a = b \end{equation}\label{thm:outer}\end{theorem}",
        );
        let mut labels = HashMap::new();
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut labels);
        assert!(result.nodes.iter().any(|n| n.id == "tex:outer" && n.entity_type == EntityType::Theorem));
        assert!(result.nodes.iter().any(|n| n.id == "tex:inner" && n.entity_type == EntityType::Formula));
    }

    #[test]
    fn test_labels_sharing_a_stem_stay_separate() {
        let c = chunk(
            "c0",
            r"\begin{theorem}[Pythagoras]\label{thm:pyth} For a right triangle,
\begin{equation}\label{eq:pyth} a^2 + b^2 = c^2 \end{equation}
\end{theorem}",
        );
        let mut labels = HashMap::new();
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut labels);

        let theorem = result.nodes.iter().find(|n| n.id == "tex:pyth").unwrap();
        assert_eq!(theorem.entity_type, EntityType::Theorem);
        assert_eq!(theorem.title, "Pythagoras");
        let formula = result.nodes.iter().find(|n| n.id == "tex:eq:pyth").unwrap();
        assert_eq!(formula.entity_type, EntityType::Formula);
        assert_eq!(labels.get("thm:pyth").map(String::as_str), Some("tex:pyth"));
        assert_eq!(labels.get("eq:pyth").map(String::as_str), Some("tex:eq:pyth"));
    }

    #[test]
    fn test_known_label_keeps_its_id() {
        let mut labels = HashMap::from([("def:x".to_string(), "tex:x".to_string())]);
        let c = chunk("c1", r"\begin{lemma}\label{lem:x} Again.\end{lemma}");
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut labels);
        assert!(result.nodes.iter().any(|n| n.id == "tex:lem:x"));
        assert!(result.nodes.iter().all(|n| n.id != "tex:x"));
    }

    #[test]
    fn test_depends_on_is_scoped_to_block() {
        let mut labels = HashMap::from([("def:x".to_string(), "tex:x".to_string())]);
        let c = chunk(
            "c1",
            r"\begin{theorem}\label{thm:y} Uses \ref{def:x}.\end{theorem} \begin{lemma}Plain.\end{lemma}",
        );
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut labels);
        let deps: Vec<_> = result
            .edges
            .iter()
            .filter(|e| e.relation_type == RelationType::DependsOn)
            .collect();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].source, "tex:y");
        assert_eq!(deps[0].target, "tex:x");
        assert_eq!(deps[0].evidence.as_deref(), Some("reference: def:x"));
    }

    #[test]
    fn test_self_reference_skipped() {
        let c = chunk("c0", r"\begin{theorem}\label{thm:a} By \ref{thm:a}.\end{theorem}");
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut HashMap::new());
        assert!(result.edges.iter().all(|e| e.relation_type != RelationType::DependsOn));
    }

    #[test]
    fn test_derived_from() {
        let mut labels = HashMap::from([("eq:base".to_string(), "tex:base".to_string())]);
        let c = chunk("c0", r"\begin{proposition}\label{prop:p} This is derived from \ref{eq:base}.\end{proposition}");
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut labels);
        let derived = result
            .edges
            .iter()
            .find(|e| e.relation_type == RelationType::DerivedFrom)
            .unwrap();
        assert_eq!(derived.source, "tex:p");
        assert_eq!(derived.evidence.as_deref(), Some(r"derived from \ref{eq:base}"));
    }

    #[test]
    fn test_example_keeps_solution_and_suppresses_steps() {
        let c = chunk(
            "c0",
            "\\begin{example}Compute $1+1$.\n\\[ 1 + 1 = 2 \\]\n\\end{example}\n\\begin{solution}It is \\[ 2 \\]\\end{solution}",
        );
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut HashMap::new());
        let example = result
            .nodes
            .iter()
            .find(|n| n.entity_type == EntityType::Example)
            .unwrap();
        assert_eq!(example.meta.get("solution").and_then(|v| v.as_str()), Some("It is \\[ 2 \\]"));
        assert!(result.nodes.iter().all(|n| n.entity_type != EntityType::Formula));
    }

    #[test]
    fn test_nested_answer_moved_to_meta() {
        let c = chunk("c0", r"\begin{exercise}Show it.\begin{answer}Done.\end{answer}\end{exercise}");
        let result = LocalExtractor::new().extract(&c, &SchemaSelection::default(), &mut HashMap::new());
        let ex = result
            .nodes
            .iter()
            .find(|n| n.entity_type == EntityType::Exercise)
            .unwrap();
        assert_eq!(ex.content.as_deref(), Some("Show it."));
        assert_eq!(ex.meta.get("answer").and_then(|v| v.as_str()), Some("Done."));
    }

    #[test]
    fn test_references_split_cref_lists() {
        assert_eq!(references(r"\cref{a, b} \eqref{a} \autoref{c}"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_deterministic() {
        let c = chunk("c0", r"\begin{theorem}\label{thm:t}$$ a^2 $$\end{theorem}");
        let selection = SchemaSelection::default();
        let a = LocalExtractor::new().extract(&c, &selection, &mut HashMap::new());
        let b = LocalExtractor::new().extract(&c, &selection, &mut HashMap::new());
        assert_eq!(a, b);
    }
}
