//! texkg Janitor
//!
//! Post-extraction cleanup of the knowledge graph.
//!
//! # Overview
//!
//! Extraction over display math produces many transient derivation steps.
//! The Janitor removes the ones that carry no identity of their own:
//!
//! - **Anchored formulas stay**: a formula with a `\label` (or a `tex:` id)
//!   is never pruned
//! - **Connected formulas stay**: any relation other than `Contains` marks a
//!   formula as meaningful
//! - **Templates go**: generic notation like `f_X(x)` or `P(X = x) = p(x)`
//! - **Exercise-local objects go**: `\Omega_5`, `A_{12}` and the like
//! - **Short isolated steps go**: content below the configured length
//!
//! Edges left dangling are removed and counted.
//!
//! # Usage
//!
//! ```no_run
//! use texkg_janitor::{Janitor, JanitorConfig};
//! use texkg_store::read_graph_file;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = read_graph_file("graph.json")?;
//! let janitor = Janitor::try_new(JanitorConfig::default())?;
//! let (pruned, stats) = janitor.prune(&graph);
//! println!("{}", stats.summary());
//! # let _ = pruned;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [prune]
//! min_formula_content_len = 120
//! drop_templates = true
//! drop_problem_indexed = true
//! dry_run = false
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod janitor;
mod stats;

pub use config::JanitorConfig;
pub use error::JanitorError;
pub use janitor::Janitor;
pub use stats::PruneStats;
