//! Closed entity and relation vocabularies

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of a graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    /// A proven statement of primary importance
    Theorem,
    /// An auxiliary proven statement
    Lemma,
    /// A statement following directly from another
    Corollary,
    /// A definition of a concept
    Definition,
    /// A displayed or labeled formula
    Formula,
    /// A worked example (solutions live in `meta`)
    Example,
    /// An exercise (answers live in `meta`)
    Exercise,
    /// An axiom
    Axiom,
    /// A proposition
    Proposition,
    /// A conclusion, also used for section anchor nodes
    Conclusion,
    /// Notation convention (only used while unifying base concepts)
    Notation,
    /// Basic construction (only used while unifying base concepts)
    Construction,
}

impl EntityType {
    /// The public vocabulary offered to users and oracles
    pub const PUBLIC: [EntityType; 10] = [
        EntityType::Theorem,
        EntityType::Lemma,
        EntityType::Corollary,
        EntityType::Definition,
        EntityType::Formula,
        EntityType::Example,
        EntityType::Exercise,
        EntityType::Axiom,
        EntityType::Proposition,
        EntityType::Conclusion,
    ];

    /// Entity types that make up the "universe of base concepts"
    pub const BASE_CONCEPTS: [EntityType; 3] = [
        EntityType::Definition,
        EntityType::Notation,
        EntityType::Construction,
    ];

    /// Canonical string form (matches the serialized form)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Theorem => "Theorem",
            EntityType::Lemma => "Lemma",
            EntityType::Corollary => "Corollary",
            EntityType::Definition => "Definition",
            EntityType::Formula => "Formula",
            EntityType::Example => "Example",
            EntityType::Exercise => "Exercise",
            EntityType::Axiom => "Axiom",
            EntityType::Proposition => "Proposition",
            EntityType::Conclusion => "Conclusion",
            EntityType::Notation => "Notation",
            EntityType::Construction => "Construction",
        }
    }

    /// Whether this type belongs to the base-concept set
    pub fn is_base_concept(&self) -> bool {
        Self::BASE_CONCEPTS.contains(self)
    }

    /// Whether this type is only meaningful while unifying identities
    pub fn is_internal(&self) -> bool {
        matches!(self, EntityType::Notation | EntityType::Construction)
    }

    /// Map a theorem-like LaTeX environment name to its entity type
    pub fn from_environment(env: &str) -> Option<Self> {
        match env.trim_end_matches('*').to_ascii_lowercase().as_str() {
            "theorem" => Some(EntityType::Theorem),
            "lemma" => Some(EntityType::Lemma),
            "corollary" => Some(EntityType::Corollary),
            "definition" => Some(EntityType::Definition),
            "example" => Some(EntityType::Example),
            "exercise" => Some(EntityType::Exercise),
            "axiom" => Some(EntityType::Axiom),
            "proposition" => Some(EntityType::Proposition),
            "conclusion" => Some(EntityType::Conclusion),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Theorem" => Ok(EntityType::Theorem),
            "Lemma" => Ok(EntityType::Lemma),
            "Corollary" => Ok(EntityType::Corollary),
            "Definition" => Ok(EntityType::Definition),
            "Formula" => Ok(EntityType::Formula),
            "Example" => Ok(EntityType::Example),
            "Exercise" => Ok(EntityType::Exercise),
            "Axiom" => Ok(EntityType::Axiom),
            "Proposition" => Ok(EntityType::Proposition),
            "Conclusion" => Ok(EntityType::Conclusion),
            "Notation" => Ok(EntityType::Notation),
            "Construction" => Ok(EntityType::Construction),
            other => Err(DomainError::UnknownEntityType(other.to_string())),
        }
    }
}

/// Type of relation between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationType {
    /// Source proves target
    Proves,
    /// Source depends on target
    DependsOn,
    /// Source is derived from target
    DerivedFrom,
    /// Source (usually a section anchor) contains target
    Contains,
    /// Source and target denote the same concept
    EquivalentTo,
    /// Source applies to target
    AppliesTo,
    /// Source uses target
    Uses,
    /// Source assists in target
    AssistsIn,
}

impl RelationType {
    /// Every relation type
    pub const ALL: [RelationType; 8] = [
        RelationType::Proves,
        RelationType::DependsOn,
        RelationType::DerivedFrom,
        RelationType::Contains,
        RelationType::EquivalentTo,
        RelationType::AppliesTo,
        RelationType::Uses,
        RelationType::AssistsIn,
    ];

    /// Canonical string form (matches the serialized form)
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Proves => "Proves",
            RelationType::DependsOn => "DependsOn",
            RelationType::DerivedFrom => "DerivedFrom",
            RelationType::Contains => "Contains",
            RelationType::EquivalentTo => "EquivalentTo",
            RelationType::AppliesTo => "AppliesTo",
            RelationType::Uses => "Uses",
            RelationType::AssistsIn => "AssistsIn",
        }
    }

    /// Relations that anchor a node as meaningful; `Contains` is structural only
    pub fn is_important(&self) -> bool {
        !matches!(self, RelationType::Contains)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationType::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| DomainError::UnknownRelationType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_round_trip_through_str() {
        for t in EntityType::PUBLIC {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
        }
        assert!("Lemmas".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_relation_parse() {
        assert_eq!("DependsOn".parse::<RelationType>().unwrap(), RelationType::DependsOn);
        assert!("dependsOn".parse::<RelationType>().is_err());
    }

    #[test]
    fn test_environment_table() {
        assert_eq!(EntityType::from_environment("theorem"), Some(EntityType::Theorem));
        assert_eq!(EntityType::from_environment("Lemma*"), Some(EntityType::Lemma));
        assert_eq!(EntityType::from_environment("equation"), None);
    }

    #[test]
    fn test_contains_is_not_important() {
        assert!(!RelationType::Contains.is_important());
        assert!(RelationType::Uses.is_important());
    }

    #[test]
    fn test_serialized_form() {
        let json = serde_json::to_string(&EntityType::Definition).unwrap();
        assert_eq!(json, "\"Definition\"");
    }
}
