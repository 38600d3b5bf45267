//! Candidate node validation logic

use crate::patterns::{
    appears_in, example_spans, is_generic_title, looks_like_math, looks_narrative_title,
    within_spans,
};
use crate::ValidationConfig;
use std::fmt;
use std::ops::Range;
use texkg_domain::graph::LABEL_ID_PREFIX;
use texkg_domain::{EntityType, GraphNode};

/// Result of candidate validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the candidate passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (if any)
    pub reasons: Vec<RejectionReason>,
}

impl ValidationResult {
    /// Whether the candidate was accepted
    pub fn is_accepted(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Candidate accepted
    Accepted,

    /// Candidate rejected
    Rejected,
}

/// Reasons for rejection
///
/// The `Display` text is the operator-facing warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// Formula content carries no math token and no label anchors it
    NotMath {
        /// Node id
        id: String,
    },

    /// Title is prose that cannot be found in the source chunk
    UnsourcedNarrativeTitle {
        /// Node id
        id: String,
        /// Offending title
        title: String,
    },

    /// Generic title, short content, no label
    Trivial {
        /// Node id
        id: String,
        /// Offending title
        title: String,
    },

    /// Unlabeled formula lifted out of a worked example
    InsideExample {
        /// Node id
        id: String,
    },
}

impl RejectionReason {
    /// Id of the rejected node
    pub fn node_id(&self) -> &str {
        match self {
            RejectionReason::NotMath { id }
            | RejectionReason::UnsourcedNarrativeTitle { id, .. }
            | RejectionReason::Trivial { id, .. }
            | RejectionReason::InsideExample { id } => id,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NotMath { id } => {
                write!(f, "Dropped formula {}: content does not look like mathematics", id)
            }
            RejectionReason::UnsourcedNarrativeTitle { id, title } => write!(
                f,
                "Dropped {}: narrative title \"{}\" does not appear in the source",
                id, title
            ),
            RejectionReason::Trivial { id, title } => {
                write!(f, "Dropped {}: trivial unlabeled node \"{}\"", id, title)
            }
            RejectionReason::InsideExample { id } => write!(
                f,
                "Dropped formula {}: unlabeled step inside an example or exercise",
                id
            ),
        }
    }
}

/// Whether a node is anchored by an explicit label
pub fn is_labeled(node: &GraphNode) -> bool {
    node.latex_label().is_some() || node.id.starts_with(LABEL_ID_PREFIX)
}

/// The Gatekeeper decides which extracted candidates enter the graph
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate one candidate against its source chunk text
    pub fn validate(&self, node: &GraphNode, chunk_text: &str) -> ValidationResult {
        let spans = example_spans(chunk_text);
        self.check(node, chunk_text, &spans)
    }

    /// Split candidates into accepted nodes and rejection reasons
    pub fn filter_candidates(
        &self,
        nodes: Vec<GraphNode>,
        chunk_text: &str,
    ) -> (Vec<GraphNode>, Vec<RejectionReason>) {
        let spans = example_spans(chunk_text);
        let mut kept = Vec::with_capacity(nodes.len());
        let mut rejected = Vec::new();
        for node in nodes {
            let result = self.check(&node, chunk_text, &spans);
            if result.is_accepted() {
                kept.push(node);
            } else {
                rejected.extend(result.reasons);
            }
        }
        (kept, rejected)
    }

    fn check(&self, node: &GraphNode, chunk_text: &str, spans: &[Range<usize>]) -> ValidationResult {
        let mut reasons = Vec::new();
        let labeled = is_labeled(node);
        let content = node.content_str().trim();
        let is_formula = node.entity_type == EntityType::Formula;

        // 1. Formulas must look like math unless a label anchors them
        if self.config.require_math_in_formulas && is_formula && !labeled && !looks_like_math(content) {
            reasons.push(RejectionReason::NotMath { id: node.id.clone() });
        }

        // 2. Prose titles must be grounded in the chunk
        if self.config.reject_unsourced_narrative_titles
            && looks_narrative_title(&node.title)
            && !appears_in(chunk_text, &node.title)
        {
            reasons.push(RejectionReason::UnsourcedNarrativeTitle {
                id: node.id.clone(),
                title: node.title.clone(),
            });
        }

        // 3. Filler entities
        if self.config.reject_trivial
            && !labeled
            && is_generic_title(&node.title)
            && content.chars().count() < self.config.trivial_max_content_len
        {
            reasons.push(RejectionReason::Trivial {
                id: node.id.clone(),
                title: node.title.clone(),
            });
        }

        // 4. Worked-example sub-steps
        if self.config.suppress_example_formulas && is_formula && !labeled && !content.is_empty() {
            if let Some(pos) = chunk_text.find(content) {
                if within_spans(spans, pos) {
                    reasons.push(RejectionReason::InsideExample { id: node.id.clone() });
                }
            }
        }

        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };
        ValidationResult { status, reasons }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texkg_domain::NodeSource;

    const CHUNK: &str = r"We study the variance.
\begin{equation}\label{eq:var} \mathrm{Var}(X) = E[X^2] - E[X]^2 \end{equation}
\begin{example} Compute
\[ 3 + 4 = 7 \]
\end{example}";

    fn formula(id: &str, title: &str, content: &str) -> GraphNode {
        GraphNode::new(id, EntityType::Formula, title).with_content(content)
    }

    #[test]
    fn test_accepts_grounded_formula() {
        let gk = Gatekeeper::default_config();
        let node = formula("f1", "Variance identity", r"\mathrm{Var}(X) = E[X^2] - E[X]^2");
        assert!(gk.validate(&node, CHUNK).is_accepted());
    }

    #[test]
    fn test_rejects_non_math_formula() {
        let gk = Gatekeeper::default_config();
        let node = formula("f2", "Variance identity", "the variance is important");
        let result = gk.validate(&node, CHUNK);
        assert_eq!(result.status, ValidationStatus::Rejected);
        assert_eq!(result.reasons, vec![RejectionReason::NotMath { id: "f2".to_string() }]);
    }

    #[test]
    fn test_label_rescues_non_math_formula() {
        let gk = Gatekeeper::default_config();
        let node = formula("tex:var", "Variance identity", "see text");
        assert!(gk.validate(&node, CHUNK).is_accepted());
    }

    #[test]
    fn test_rejects_unsourced_narrative_title() {
        let gk = Gatekeeper::default_config();
        let node = GraphNode::new("d1", EntityType::Definition, "Here we carefully introduce the notion of spread")
            .with_content("Variance measures spread around the mean value of X.");
        let result = gk.validate(&node, CHUNK);
        assert!(matches!(
            result.reasons.as_slice(),
            [RejectionReason::UnsourcedNarrativeTitle { .. }]
        ));
    }

    #[test]
    fn test_narrative_title_found_in_chunk_is_kept() {
        let gk = Gatekeeper::default_config();
        let chunk = "In this part we study the variance of a random variable.";
        let node = GraphNode::new("d1", EntityType::Definition, "we study the variance of a random variable")
            .with_content("Variance measures spread around the mean value of X.");
        assert!(gk.validate(&node, chunk).is_accepted());
    }

    #[test]
    fn test_rejects_trivial_node() {
        let gk = Gatekeeper::default_config();
        let node = GraphNode::new("x1", EntityType::Lemma, "Lemma 2").with_content("trivial");
        let result = gk.validate(&node, CHUNK);
        assert!(matches!(result.reasons.as_slice(), [RejectionReason::Trivial { .. }]));
        assert!(result.reasons[0].to_string().contains("x1"));
    }

    #[test]
    fn test_rejects_formula_inside_example() {
        let gk = Gatekeeper::default_config();
        let node = formula("f3", "Sum", "3 + 4 = 7");
        let result = gk.validate(&node, CHUNK);
        assert_eq!(result.reasons, vec![RejectionReason::InsideExample { id: "f3".to_string() }]);

        let permissive = Gatekeeper::new(ValidationConfig::permissive());
        assert!(permissive.validate(&node, CHUNK).is_accepted());
    }

    #[test]
    fn test_filter_candidates_splits() {
        let gk = Gatekeeper::default_config();
        let labeled = formula("n1", "Formula 1", "x").with_source(NodeSource {
            file: "a.tex".to_string(),
            latex_label: Some("eq:var".to_string()),
            section_path: None,
        });
        let junk = formula("n2", "Formula 2", "words only");
        let (kept, rejected) = gk.filter_candidates(vec![labeled, junk], CHUNK);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "n1");
        assert_eq!(rejected.len(), 2);
        assert!(rejected.iter().all(|r| r.node_id() == "n2"));
    }
}
