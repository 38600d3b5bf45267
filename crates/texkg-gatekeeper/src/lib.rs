//! texkg Gatekeeper
//!
//! One candidate-validity policy shared by every path that puts nodes into
//! the graph.
//!
//! The Gatekeeper provides:
//! - Grounding checks for oracle output (math detection, narrative titles)
//! - Triviality filtering
//! - Suppression of unlabeled worked-example steps
//! - The noise recognizers used by the Pruner
//!
//! # Examples
//!
//! ```
//! use texkg_gatekeeper::{Gatekeeper, ValidationConfig};
//! use texkg_domain::{EntityType, GraphNode};
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//! let node = GraphNode::new("f", EntityType::Formula, "Sum").with_content("a + b = c");
//! assert!(gatekeeper.validate(&node, "text with a + b = c").is_accepted());
//! ```

#![warn(missing_docs)]

mod config;
pub mod patterns;
mod validator;

pub use config::ValidationConfig;
pub use patterns::{find_environments, EnvSpan};
pub use validator::{is_labeled, Gatekeeper, RejectionReason, ValidationResult, ValidationStatus};
