//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;
use texkg_domain::ChunkGranularity;
use texkg_gatekeeper::ValidationConfig;

/// Configuration for segmentation and extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Heading level at which chunks are cut
    pub granularity: ChunkGranularity,

    /// Approximate token budget per chunk; oversized chunks become windows
    pub max_tokens: Option<usize>,

    /// Maximum titles returned by a chunk preview
    pub preview_titles: usize,

    /// Maximum nodes listed in the graph summary handed to the oracle
    pub summary_max_nodes: usize,

    /// Maximum edges listed in the graph summary handed to the oracle
    pub summary_max_edges: usize,

    /// Maximum base concepts listed in the concept registry
    pub registry_max_entries: usize,

    /// Maximum time for a single oracle call (seconds)
    pub extraction_timeout_secs: u64,

    /// Characters taken on either side of a label when no block encloses it
    pub completion_window_chars: usize,

    /// Longest span accepted when recovering elided content
    pub max_recovery_chars: usize,

    /// Alias candidates sent to the oracle per alignment request
    pub align_batch_size: usize,

    /// Candidate validity rules shared by every extraction path
    pub validation: ValidationConfig,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Chunk budget with `0` treated as unlimited
    pub fn token_budget(&self) -> Option<usize> {
        self.max_tokens.filter(|&n| n > 0)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.summary_max_nodes == 0 {
            return Err("summary_max_nodes must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if self.max_recovery_chars == 0 {
            return Err("max_recovery_chars must be greater than 0".to_string());
        }
        if !(20..=120).contains(&self.align_batch_size) {
            return Err("align_batch_size must be between 20 and 120".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            granularity: ChunkGranularity::Section,
            max_tokens: Some(6000),
            preview_titles: 10,
            summary_max_nodes: 160,
            summary_max_edges: 80,
            registry_max_entries: 200,
            extraction_timeout_secs: 180,
            completion_window_chars: 4000,
            max_recovery_chars: 60_000,
            align_batch_size: 80,
            validation: ValidationConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: small chunks, short context, strict grounding
    pub fn aggressive() -> Self {
        Self {
            granularity: ChunkGranularity::Subsection,
            max_tokens: Some(3000),
            summary_max_nodes: 80,
            summary_max_edges: 40,
            registry_max_entries: 100,
            extraction_timeout_secs: 90,
            validation: ValidationConfig::strict(),
            ..Self::default()
        }
    }

    /// Lenient preset: large chunks, wide context, permissive grounding
    pub fn lenient() -> Self {
        Self {
            granularity: ChunkGranularity::Chapter,
            max_tokens: Some(12_000),
            summary_max_nodes: 240,
            summary_max_edges: 120,
            registry_max_entries: 400,
            extraction_timeout_secs: 300,
            validation: ValidationConfig::permissive(),
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.summary_max_nodes, 160);
        assert_eq!(config.summary_max_edges, 80);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
        assert_eq!(ExtractorConfig::aggressive().granularity, ChunkGranularity::Subsection);
    }

    #[test]
    fn test_invalid_batch_size() {
        let config = ExtractorConfig {
            align_batch_size: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tokens_means_unlimited() {
        let config = ExtractorConfig {
            max_tokens: Some(0),
            ..Default::default()
        };
        assert_eq!(config.token_budget(), None);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ExtractorConfig::aggressive();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ExtractorConfig::from_toml("granularity = \"chapter\"\n").unwrap();
        assert_eq!(parsed.granularity, ChunkGranularity::Chapter);
        assert_eq!(parsed.max_tokens, Some(6000));
    }
}
