//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use texkg_domain::SamplingParams;
use texkg_extractor::ExtractorConfig;

/// Upper bound on concurrent phase-2 oracle calls
pub const MAX_CONCURRENCY: usize = 32;

/// Which extractor drives a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Heuristic extraction, strictly sequential
    #[default]
    Local,
    /// Oracle extraction with ordered commits
    Oracle,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Local => f.write_str("local"),
            ExtractionMode::Oracle => f.write_str("oracle"),
        }
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "heuristic" => Ok(ExtractionMode::Local),
            "oracle" | "llm" => Ok(ExtractionMode::Oracle),
            other => Err(format!("Unknown extraction mode: {}", other)),
        }
    }
}

/// Configuration for one pipeline run
///
/// # Examples
///
/// ```
/// use texkg_pipeline::{ExtractionMode, PipelineConfig};
///
/// let config = PipelineConfig::from_toml("mode = \"oracle\"\nconcurrency = 64").unwrap();
/// assert_eq!(config.mode, ExtractionMode::Oracle);
/// assert_eq!(config.effective_concurrency(), 32);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extraction mode
    pub mode: ExtractionMode,

    /// Maximum in-flight phase-2 oracle calls (clamped to 1..=32)
    pub concurrency: usize,

    /// Run the base-concept phase and freeze before full extraction
    pub phase_aware: bool,

    /// Ask the oracle for alias decisions before freezing
    pub align_concepts: bool,

    /// Save a snapshot every N committed oracle calls (0 disables)
    pub snapshot_every: usize,

    /// Oracle sampling parameters
    pub sampling: SamplingParams,

    /// Segmentation and extraction settings
    pub extractor: ExtractorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Local,
            concurrency: 4,
            phase_aware: true,
            align_concepts: false,
            snapshot_every: 10,
            sampling: SamplingParams::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Local-mode configuration
    pub fn local() -> Self {
        Self::default()
    }

    /// Oracle-mode configuration with the given concurrency
    pub fn oracle(concurrency: usize) -> Self {
        Self {
            mode: ExtractionMode::Oracle,
            concurrency,
            ..Self::default()
        }
    }

    /// Concurrency bound actually used
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.sampling.temperature) {
            return Err("sampling.temperature must be between 0 and 2".to_string());
        }
        if !(0.0..=1.0).contains(&self.sampling.top_p) {
            return Err("sampling.top_p must be between 0 and 1".to_string());
        }
        if self.sampling.max_tokens == 0 {
            return Err("sampling.max_tokens must be greater than 0".to_string());
        }
        self.extractor.validate()
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
