//! Content completion from the source chunk
//!
//! Oracle content is not trusted to be complete. A labeled node whose content
//! is short or elided is re-sliced from the chunk around its label; an
//! unlabeled elided node is recovered from the text between the prefix and
//! suffix around the elision marker.

use crate::heuristic::{MATH_ENVIRONMENTS, THEOREM_LIKE_ENVIRONMENTS};
use crate::latex::{ceil_boundary, floor_boundary};
use serde_json::Value;
use texkg_domain::graph::LABEL_ID_PREFIX;
use texkg_domain::{label_stem, EntityType, GraphNode};
use texkg_gatekeeper::find_environments;
use texkg_gatekeeper::patterns::{contains_ellipsis, labels_in, looks_narrative_title};

const MIN_TRUSTED_CONTENT_CHARS: usize = 20;
const MIN_AFFIX_CHARS: usize = 10;

/// Re-slices node content from chunk text
#[derive(Debug, Clone)]
pub struct ContentCompleter {
    window_chars: usize,
    max_recovery_chars: usize,
}

impl Default for ContentCompleter {
    fn default() -> Self {
        Self::new(4000, 60_000)
    }
}

impl ContentCompleter {
    /// Create a completer
    ///
    /// `window_chars` bounds the fallback slice on either side of a bare
    /// label; `max_recovery_chars` bounds prefix/suffix recoveries.
    pub fn new(window_chars: usize, max_recovery_chars: usize) -> Self {
        Self {
            window_chars,
            max_recovery_chars,
        }
    }

    /// Complete nodes in place, returning how many were changed
    pub fn complete(&self, nodes: &mut [GraphNode], chunk_text: &str) -> usize {
        let mut changed = 0;
        for node in nodes.iter_mut() {
            if self.complete_node(node, chunk_text) {
                changed += 1;
            }
        }
        changed
    }

    fn complete_node(&self, node: &mut GraphNode, chunk_text: &str) -> bool {
        let content = node.content_str().trim().to_string();
        let label = node_label(node, chunk_text);

        if let Some(label) = &label {
            if needs_completion(&content) {
                if let Some(full) = self.block_by_label(chunk_text, label) {
                    if full != content {
                        replace_content(node, full, &content);
                    }
                    if node.entity_type == EntityType::Formula {
                        node.title = normalized_formula_title(&node.title, label);
                    }
                    return true;
                }
            }
            return false;
        }

        if contains_ellipsis(&content) {
            if let Some(recovered) = self.recover_by_prefix_suffix(chunk_text, &content) {
                replace_content(node, recovered, &content);
                return true;
            }
        }
        false
    }

    /// Full source of the block carrying `\label{label}`
    pub fn block_by_label(&self, chunk_text: &str, label: &str) -> Option<String> {
        let needle = format!("\\label{{{}}}", label);

        for names in [&THEOREM_LIKE_ENVIRONMENTS[..], &MATH_ENVIRONMENTS[..]] {
            for name in names {
                for env in find_environments(chunk_text, &[*name]) {
                    let body = env.body(chunk_text).trim();
                    if body.contains(&needle) {
                        return Some(body.to_string());
                    }
                }
            }
        }

        let idx = chunk_text.find(&needle)?;
        let start = floor_boundary(chunk_text, idx.saturating_sub(self.window_chars));
        let end = ceil_boundary(chunk_text, idx.saturating_add(self.window_chars));
        Some(chunk_text[start..end].trim().to_string())
    }

    /// Literal chunk text spanning the prefix and suffix around an elision
    pub fn recover_by_prefix_suffix(&self, chunk_text: &str, content: &str) -> Option<String> {
        let marker = if content.contains('…') { "…" } else { "..." };
        let parts: Vec<&str> = content.split(marker).collect();
        if parts.len() < 2 {
            return None;
        }
        let prefix = parts[0].trim();
        let suffix = parts[parts.len() - 1].trim();
        if prefix.chars().count() < MIN_AFFIX_CHARS || suffix.chars().count() < MIN_AFFIX_CHARS {
            return None;
        }

        let start = chunk_text.find(prefix)?;
        let search_from = start + prefix.len();
        let end = chunk_text[search_from..].find(suffix)? + search_from + suffix.len();
        let recovered = chunk_text[start..end].trim();
        if recovered.chars().count() > self.max_recovery_chars {
            return None;
        }
        Some(recovered.to_string())
    }
}

/// Label used for completion
///
/// The source label when present. Otherwise a `tex:` id is matched against
/// the chunk's labels, verbatim first, then by stem when exactly one chunk
/// label has it (`tex:ring` finds `\label{def:ring}`).
fn node_label(node: &GraphNode, chunk_text: &str) -> Option<String> {
    if let Some(label) = node.latex_label() {
        return Some(label.trim().to_string());
    }
    let rest = node.id.strip_prefix(LABEL_ID_PREFIX).filter(|s| !s.is_empty())?;
    let labels = labels_in(chunk_text);
    if labels.iter().any(|l| l == rest) {
        return Some(rest.to_string());
    }
    let mut by_stem = labels.into_iter().filter(|l| label_stem(l) == rest);
    match (by_stem.next(), by_stem.next()) {
        (Some(label), None) => Some(label),
        _ => None,
    }
}

fn needs_completion(content: &str) -> bool {
    content.is_empty() || content.chars().count() < MIN_TRUSTED_CONTENT_CHARS || contains_ellipsis(content)
}

fn replace_content(node: &mut GraphNode, full: String, previous: &str) {
    if !previous.is_empty() {
        node.meta
            .insert("originalContent".to_string(), Value::String(previous.to_string()));
    }
    node.content = Some(full);
}

/// Stable title for a labeled formula whose title is prose or label-free
pub fn normalized_formula_title(title: &str, label: &str) -> String {
    let trimmed = title.trim();
    if looks_narrative_title(trimmed) || !trimmed.contains(label) {
        format!("Formula ({})", label)
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texkg_domain::NodeSource;

    const CHUNK: &str = r"Intro text.
\begin{theorem}\label{thm:main} For all $n$, $\sum_{k=1}^n k = \frac{n(n+1)}{2}$ holds.\end{theorem}
\begin{align}\label{eq:sq} (a+b)^2 = a^2 + 2ab + b^2 \end{align}
The estimate follows from monotonicity of the integral and careful bookkeeping of constants.";

    fn labeled(id: &str, t: EntityType, title: &str, content: &str, label: &str) -> GraphNode {
        GraphNode::new(id, t, title).with_content(content).with_source(NodeSource {
            file: "a.tex".to_string(),
            latex_label: Some(label.to_string()),
            section_path: None,
        })
    }

    #[test]
    fn test_completes_elided_theorem() {
        let mut nodes = vec![labeled("tex:main", EntityType::Theorem, "Main", "For all n ...", "thm:main")];
        let changed = ContentCompleter::default().complete(&mut nodes, CHUNK);
        assert_eq!(changed, 1);
        assert!(nodes[0].content_str().starts_with(r"\label{thm:main} For all $n$"));
        assert_eq!(nodes[0].meta.get("originalContent"), Some(&Value::from("For all n ...")));
    }

    #[test]
    fn test_completes_formula_and_normalizes_title() {
        let mut nodes = vec![labeled("tex:sq", EntityType::Formula, "Square of a sum", "", "eq:sq")];
        ContentCompleter::default().complete(&mut nodes, CHUNK);
        assert!(nodes[0].content_str().contains("(a+b)^2"));
        assert_eq!(nodes[0].title, "Formula (eq:sq)");
        assert!(nodes[0].meta.get("originalContent").is_none());
    }

    #[test]
    fn test_label_found_from_bare_id() {
        let text = r"\begin{definition}\label{def:ring} A ring is a set $R$ with addition and multiplication.\end{definition}";
        let mut nodes = vec![GraphNode::new("tex:ring", EntityType::Definition, "Ring").with_content("A ring is ...")];
        assert_eq!(ContentCompleter::default().complete(&mut nodes, text), 1);
        assert!(nodes[0].content_str().contains("addition and multiplication"));
    }

    #[test]
    fn test_ambiguous_stem_is_not_guessed() {
        let text = r"\begin{definition}\label{def:ring}A ring.\end{definition}\begin{theorem}\label{thm:ring}Rings exist.\end{theorem}";
        let mut nodes = vec![GraphNode::new("tex:ring", EntityType::Definition, "Ring").with_content("A ring is ...")];
        ContentCompleter::default().complete(&mut nodes, text);
        assert_eq!(nodes[0].content_str(), "A ring is ...");
    }

    #[test]
    fn test_complete_content_untouched() {
        let full = "A sufficiently long and complete statement of the theorem.";
        let mut nodes = vec![labeled("tex:main", EntityType::Theorem, "Main", full, "thm:main")];
        assert_eq!(ContentCompleter::default().complete(&mut nodes, CHUNK), 0);
        assert_eq!(nodes[0].content_str(), full);
    }

    #[test]
    fn test_window_fallback() {
        let text = format!("{}\\label{{bare}}{}", "a".repeat(50), "b".repeat(50));
        let completer = ContentCompleter::new(20, 60_000);
        let block = completer.block_by_label(&text, "bare").unwrap();
        assert_eq!(block, format!("{}\\label{{bare}}{}", "a".repeat(20), "b".repeat(8)));
    }

    #[test]
    fn test_unlabeled_recovery() {
        let mut nodes = vec![GraphNode::new("n1", EntityType::Conclusion, "Estimate")
            .with_content("The estimate follows … bookkeeping of constants.")];
        ContentCompleter::default().complete(&mut nodes, CHUNK);
        assert_eq!(
            nodes[0].content_str(),
            "The estimate follows from monotonicity of the integral and careful bookkeeping of constants."
        );
    }

    #[test]
    fn test_recovery_needs_long_affixes() {
        let completer = ContentCompleter::default();
        assert_eq!(completer.recover_by_prefix_suffix(CHUNK, "Intro ... text."), None);
    }

    #[test]
    fn test_recovery_length_cap() {
        let completer = ContentCompleter::new(4000, 20);
        assert_eq!(
            completer.recover_by_prefix_suffix(CHUNK, "The estimate follows ... bookkeeping of constants."),
            None
        );
    }

    #[test]
    fn test_title_kept_when_it_mentions_label() {
        assert_eq!(normalized_formula_title("Identity eq:sq", "eq:sq"), "Identity eq:sq");
        assert_eq!(normalized_formula_title("Square", "eq:sq"), "Formula (eq:sq)");
    }
}
