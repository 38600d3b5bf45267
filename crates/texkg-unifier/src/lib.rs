//! texkg Identity Unifier
//!
//! Conservative identity unification over the base-concept namespace.
//!
//! # Overview
//!
//! After the first extraction phase the graph holds many candidate concepts
//! extracted chunk by chunk. [`freeze_namespace`] folds together the ones
//! that are provably the same object and returns an [`AliasMap`]; later
//! extraction batches are rewritten onto the frozen ids with
//! [`apply_alias_mapping`].
//!
//! Two ids are unified only when:
//!
//! - they carry the same explicit `\label{...}` (the label's canonical
//!   `tex:` id joins the same class and is preferred as representative), or
//! - an `EquivalentTo` edge joins two base-concept nodes, or
//! - a confident alignment decision names two present base-concept nodes.
//!
//! A false merge is worse than a missed merge, so titles and content are
//! never compared.
//!
//! # Example
//!
//! ```
//! use texkg_domain::{EntityType, Graph, GraphEdge, GraphNode, RelationType};
//! use texkg_unifier::freeze_namespace;
//!
//! let graph = Graph {
//!     nodes: vec![
//!         GraphNode::new("a", EntityType::Definition, "Group"),
//!         GraphNode::new("b", EntityType::Notation, "Group"),
//!     ],
//!     edges: vec![GraphEdge::new(RelationType::EquivalentTo, "b", "a")],
//! };
//! let frozen = freeze_namespace(&graph, &[]);
//! assert_eq!(frozen.graph.nodes.len(), 1);
//! assert_eq!(frozen.alias_map.resolve("b"), "a");
//! ```

#![warn(missing_docs)]

mod alias;
mod freeze;
mod merge;
mod union_find;

pub use alias::{apply_alias_mapping, AliasMap};
pub use freeze::{freeze_namespace, FrozenNamespace};
