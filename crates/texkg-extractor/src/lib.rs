//! texkg Extractor
//!
//! Turns LaTeX sources into candidate graph nodes and edges.
//!
//! # Overview
//!
//! Extraction runs in two steps. The [`LatexSegmenter`] cuts files into
//! section-aware chunks; each chunk is then handed either to the
//! deterministic [`LocalExtractor`] or to the [`OracleExtractor`], which wraps
//! an [`ExtractionOracle`](texkg_domain::ExtractionOracle) and fact-checks its
//! output against the chunk text.
//!
//! # Architecture
//!
//! ```text
//! SourceFile[] → LatexSegmenter → LatexChunk[]
//!                                    │
//!                    ┌───────────────┴───────────────┐
//!              LocalExtractor                 OracleExtractor
//!            (labels, \ref, envs)   (prompt → oracle → parse → ground)
//!                    └───────────────┬───────────────┘
//!                             ExtractionResult
//! ```
//!
//! # Example Usage
//!
//! ```
//! use std::collections::HashMap;
//! use texkg_domain::{ChunkGranularity, SchemaSelection, SourceFile};
//! use texkg_extractor::{LatexSegmenter, LocalExtractor};
//!
//! let files = vec![SourceFile::new(
//!     "book.tex",
//!     "\\section{Rings}\n\\begin{definition}\\label{def:ring}A ring.\\end{definition}",
//! )];
//! let chunks = LatexSegmenter::new(ChunkGranularity::Section, None).segment(&files);
//!
//! let mut labels = HashMap::new();
//! let result = LocalExtractor::new().extract(&chunks[0], &SchemaSelection::default(), &mut labels);
//! assert!(result.nodes.iter().any(|n| n.id == "tex:ring"));
//! ```

#![warn(missing_docs)]

mod chunking;
mod completion;
mod config;
mod error;
mod grounding;
mod heuristic;
pub mod latex;
mod oracle;
mod parser;
mod prompt;
mod summary;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::{approx_token_spans, ChunkPreview, LatexSegmenter};
pub use completion::{normalized_formula_title, ContentCompleter};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use grounding::ground_candidates;
pub use heuristic::{references, LocalExtractor, MATH_ENVIRONMENTS, THEOREM_LIKE_ENVIRONMENTS};
pub use oracle::OracleExtractor;
pub use parser::{parse_oracle_response, ParsedResponse};
pub use prompt::{build_align_prompt, AlignCard, PromptBuilder};
pub use summary::{concept_registry, summarize_graph};
pub use types::{OracleRequest, Phase};
