//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// texkg - Extract a typed mathematical knowledge graph from LaTeX sources.
#[derive(Debug, Parser)]
#[command(name = "texkg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (defaults to ~/.texkg/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "texkg_pipeline=debug")
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (counts and ids only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a knowledge graph from a directory of .tex files
    Extract(ExtractArgs),

    /// Show how documents would be chunked
    Preview(PreviewArgs),

    /// Prune transient formulas from a saved graph
    Prune(PruneArgs),

    /// Manage saved snapshots
    Snapshots(SnapshotsArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Directory (searched recursively) or single .tex file
    pub input: PathBuf,

    /// Write the graph JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extraction mode
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Oracle provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Oracle model name
    #[arg(long)]
    pub model: Option<String>,

    /// Oracle endpoint or base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API key for OpenAI-compatible providers
    #[arg(long, env = "TEXKG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Maximum concurrent oracle calls in the full-extraction phase
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Chunk granularity (file, chapter, section, subsection, paragraph)
    #[arg(short, long)]
    pub granularity: Option<String>,

    /// Continue from an existing graph JSON file
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Single-pass oracle extraction (no base-concept phase)
    #[arg(long)]
    pub single_pass: bool,

    /// Ask the oracle to align duplicate concepts before freezing
    #[arg(long)]
    pub align: bool,

    /// Prune the graph after extraction
    #[arg(long)]
    pub prune: bool,

    /// Save periodic snapshots during oracle extraction
    #[arg(long)]
    pub snapshots: bool,

    /// Committed oracle calls between snapshots
    #[arg(long)]
    pub snapshot_every: Option<usize>,
}

/// Arguments for the preview command.
#[derive(Debug, Parser)]
pub struct PreviewArgs {
    /// Directory (searched recursively) or single .tex file
    pub input: PathBuf,

    /// Chunk granularity (file, chapter, section, subsection, paragraph)
    #[arg(short, long)]
    pub granularity: Option<String>,

    /// Number of chunk titles to show
    #[arg(short, long)]
    pub titles: Option<usize>,
}

/// Arguments for the prune command.
#[derive(Debug, Parser)]
pub struct PruneArgs {
    /// Graph JSON file
    pub input: PathBuf,

    /// Write the pruned graph here (defaults to overwriting the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Minimum content length for isolated unlabeled formulas
    #[arg(long)]
    pub min_len: Option<usize>,

    /// Keep template formulas
    #[arg(long)]
    pub keep_templates: bool,

    /// Keep exercise-indexed formulas
    #[arg(long)]
    pub keep_problem_indexed: bool,

    /// Report what would be dropped without writing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for snapshot management.
#[derive(Debug, Parser)]
pub struct SnapshotsArgs {
    #[command(subcommand)]
    pub action: SnapshotAction,
}

/// Snapshot management actions.
#[derive(Debug, Subcommand)]
pub enum SnapshotAction {
    /// List snapshots, newest first
    List,

    /// Write a snapshot's graph as JSON
    Load {
        /// Snapshot id
        id: String,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete snapshots
    Clear {
        /// Keep the newest snapshot
        #[arg(long)]
        keep_latest: bool,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Extraction mode argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    /// Heuristic extraction, no oracle
    Local,
    /// Oracle extraction
    Oracle,
}

/// Oracle provider argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible chat completions endpoint
    Openai,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<ModeArg> for texkg_pipeline::ExtractionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Local => texkg_pipeline::ExtractionMode::Local,
            ModeArg::Oracle => texkg_pipeline::ExtractionMode::Oracle,
        }
    }
}

impl From<ProviderArg> for crate::config::Provider {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Ollama => crate::config::Provider::Ollama,
            ProviderArg::Openai => crate::config::Provider::OpenAi,
        }
    }
}
