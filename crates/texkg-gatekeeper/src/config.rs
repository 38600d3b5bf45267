//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Configuration for candidate validity rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject unlabeled Formula nodes whose content does not look like math
    pub require_math_in_formulas: bool,

    /// Reject narrative titles not literally present in the chunk
    pub reject_unsourced_narrative_titles: bool,

    /// Reject generically-titled, short, unlabeled nodes
    pub reject_trivial: bool,

    /// Content length below which an unlabeled generic node is trivial
    pub trivial_max_content_len: usize,

    /// Reject unlabeled Formula nodes lying inside Example/Exercise blocks
    pub suppress_example_formulas: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_math_in_formulas: true,
            reject_unsourced_narrative_titles: true,
            reject_trivial: true,
            trivial_max_content_len: 40,
            suppress_example_formulas: true,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (only the math check)
    pub fn permissive() -> Self {
        Self {
            require_math_in_formulas: true,
            reject_unsourced_narrative_titles: false,
            reject_trivial: false,
            trivial_max_content_len: 0,
            suppress_example_formulas: false,
        }
    }

    /// Create a strict configuration (all checks, wider triviality window)
    pub fn strict() -> Self {
        Self {
            trivial_max_content_len: 80,
            ..Self::default()
        }
    }
}
