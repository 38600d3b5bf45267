//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use texkg_janitor::JanitorConfig;
use texkg_pipeline::PipelineConfig;

/// CLI configuration.
///
/// Loaded from `~/.texkg/config.toml` unless `--config` names another file.
/// Command-line flags override file values. API keys are never read from or
/// written to this file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Oracle connection
    #[serde(default)]
    pub oracle: OracleSettings,

    /// Extraction run settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Pruner settings
    #[serde(default)]
    pub prune: JanitorConfig,

    /// Snapshot storage
    #[serde(default)]
    pub snapshots: SnapshotSettings,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// Oracle provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions endpoint
    OpenAi,
}

/// Oracle connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    /// Provider
    pub provider: Provider,
    /// Model name
    pub model: String,
    /// Endpoint or base URL; the provider default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Attempts per request (Ollama only)
    pub max_retries: u32,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: "qwen2.5:14b".to_string(),
            endpoint: None,
            timeout_secs: 180,
            max_retries: 3,
        }
    }
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSettings {
    /// SQLite database path; `~/.texkg/snapshots.db` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Directory holding the default config and snapshot database.
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".texkg"))
    }

    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("config.toml"))
    }

    /// Load configuration from `path` (or the default path).
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path` (or the default path).
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate().map_err(CliError::Config)?;
        self.prune.validate().map_err(CliError::Config)?;
        if self.oracle.model.trim().is_empty() {
            return Err(CliError::Config("oracle.model must not be empty".into()));
        }
        Ok(())
    }

    /// Snapshot database path.
    pub fn snapshot_db_path(&self) -> Result<PathBuf> {
        match &self.snapshots.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::dir()?.join("snapshots.db")),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
