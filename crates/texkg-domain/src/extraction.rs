//! Per-chunk extraction output and schema selection

use crate::{EntityType, GraphEdge, GraphNode, RelationType};
use serde::{Deserialize, Serialize};

/// Transient candidate nodes/edges produced for one chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Candidate nodes
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    /// Candidate edges
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    /// Human-readable warnings (grounding rejections, oracle failures)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    /// Empty result carrying a single warning
    pub fn from_warning(warning: impl Into<String>) -> Self {
        Self {
            warnings: vec![warning.into()],
            ..Default::default()
        }
    }

    /// Whether nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// User-selected entity/relation vocabulary plus free-text guidance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSelection {
    /// Allowed entity types
    pub entity_types: Vec<EntityType>,
    /// Allowed relation types
    pub relation_types: Vec<RelationType>,
    /// Optional guidance passed to the oracle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for SchemaSelection {
    fn default() -> Self {
        Self {
            entity_types: EntityType::PUBLIC.to_vec(),
            relation_types: RelationType::ALL.to_vec(),
            notes: None,
        }
    }
}

impl SchemaSelection {
    /// Whether an entity type is selected
    pub fn allows_entity(&self, t: EntityType) -> bool {
        self.entity_types.contains(&t)
    }

    /// Whether a relation type is selected
    pub fn allows_relation(&self, r: RelationType) -> bool {
        self.relation_types.contains(&r)
    }

    /// Restricted vocabulary used while building the universe of base concepts
    ///
    /// Entities: Definition (if selected), Notation, Construction.
    /// Relations: DependsOn (if selected) and EquivalentTo.
    pub fn base_concepts(&self) -> SchemaSelection {
        let mut entity_types = Vec::new();
        if self.allows_entity(EntityType::Definition) {
            entity_types.push(EntityType::Definition);
        }
        entity_types.push(EntityType::Notation);
        entity_types.push(EntityType::Construction);

        let mut relation_types = Vec::new();
        if self.allows_relation(RelationType::DependsOn) {
            relation_types.push(RelationType::DependsOn);
        }
        relation_types.push(RelationType::EquivalentTo);

        SchemaSelection {
            entity_types,
            relation_types,
            notes: self.notes.clone(),
        }
    }
}

/// Minimum confidence for an externally supplied alias decision
pub const MIN_ALIGN_CONFIDENCE: f64 = 0.88;

/// An oracle-proposed `alias -> canonical` identity decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignDecision {
    /// Id to be folded away
    pub alias: String,
    /// Id to keep
    pub canonical: String,
    /// Oracle confidence in `0.0..=1.0`
    pub confidence: f64,
    /// One-line justification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AlignDecision {
    /// Whether the decision clears the conservative confidence bar
    pub fn is_confident(&self) -> bool {
        self.confidence >= MIN_ALIGN_CONFIDENCE && self.alias != self.canonical
    }
}
