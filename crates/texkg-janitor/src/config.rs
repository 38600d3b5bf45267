//! Configuration for pruning

use serde::{Deserialize, Serialize};

/// Configuration for the Janitor
///
/// # Examples
///
/// ```
/// use texkg_janitor::JanitorConfig;
///
/// let config = JanitorConfig::default();
/// assert_eq!(config.min_formula_content_len, 120);
///
/// // Drops longer isolated formulas too
/// assert!(JanitorConfig::aggressive().min_formula_content_len > 120);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JanitorConfig {
    /// Isolated unlabeled formulas shorter than this (in chars) are dropped
    /// Default: 120
    pub min_formula_content_len: usize,

    /// Drop generic template formulas (`f_X(x)`, `P(X = x) = p(x)`, ...)
    /// Default: true
    pub drop_templates: bool,

    /// Drop exercise-local indexed objects (`\Omega_5`, `A_{12}`, ...)
    /// Default: true
    pub drop_problem_indexed: bool,

    /// Dry-run mode: report what would be dropped without dropping it
    /// Default: false
    pub dry_run: bool,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            min_formula_content_len: 120,
            drop_templates: true,
            drop_problem_indexed: true,
            dry_run: false,
        }
    }
}

impl JanitorConfig {
    /// Aggressive pruning: longer formulas count as transient steps
    pub fn aggressive() -> Self {
        Self {
            min_formula_content_len: 200,
            ..Self::default()
        }
    }

    /// Lenient pruning: only very short steps and templates go
    pub fn lenient() -> Self {
        Self {
            min_formula_content_len: 40,
            drop_problem_indexed: false,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_formula_content_len > 100_000 {
            return Err("min_formula_content_len must be at most 100000".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JanitorConfig::default();
        assert_eq!(config.min_formula_content_len, 120);
        assert!(config.drop_templates);
        assert!(config.drop_problem_indexed);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let default = JanitorConfig::default().min_formula_content_len;
        assert!(JanitorConfig::aggressive().min_formula_content_len > default);
        assert!(JanitorConfig::lenient().min_formula_content_len < default);
    }

    #[test]
    fn test_serde_partial() {
        let config: JanitorConfig = serde_json::from_str(r#"{"dry_run": true}"#).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.min_formula_content_len, 120);
    }

    #[test]
    fn test_validate_rejects_absurd_threshold() {
        let config = JanitorConfig {
            min_formula_content_len: 1_000_000,
            ..JanitorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
