//! Extract command implementation.

use super::parse_granularity;
use crate::cli::ExtractArgs;
use crate::config::{Config, OracleSettings, Provider};
use crate::error::{CliError, Result};
use crate::input::load_sources;
use crate::output::Formatter;
use std::sync::Arc;
use texkg_domain::{ExtractionOracle, SchemaSelection};
use texkg_janitor::Janitor;
use texkg_llm::{openai, OllamaOracle, OpenAiOracle};
use texkg_pipeline::{CancellationToken, ExtractionMode, Pipeline, PipelineConfig, PipelineProgress, PipelineStatus};
use texkg_store::{export_graph_json, read_graph_file, write_graph_file, SqliteSnapshotStore};
use tokio::sync::watch;
use tracing::{info, warn};

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let pipeline_config = pipeline_config(&args, config)?;
    let files = load_sources(&args.input)?;

    let mut pipeline = Pipeline::new(pipeline_config.clone(), SchemaSelection::default());
    if let Some(path) = &args.resume {
        let graph = read_graph_file(path)?;
        info!("Resuming from {} ({} nodes)", path.display(), graph.nodes.len());
        pipeline = pipeline.with_graph(graph);
    }
    if pipeline_config.mode == ExtractionMode::Oracle {
        pipeline = pipeline.with_oracle(build_oracle(&config.oracle, &args)?);
    }
    if args.snapshots {
        let path = config.snapshot_db_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("Saving snapshots to {}", path.display());
        pipeline = pipeline.with_snapshot_store(Box::new(SqliteSnapshotStore::new(&path)?));
    }

    let cancel = CancellationToken::new();
    let ctrlc_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, cancelling extraction");
            ctrlc_token.cancel();
        }
    });
    let progress = tokio::spawn(log_progress(pipeline.subscribe()));

    let outcome = pipeline.start(&files, cancel).await;
    progress.abort();
    let report = outcome?;

    let mut graph = pipeline.into_graph();
    if args.prune && report.status == PipelineStatus::Done {
        let janitor = Janitor::try_new(config.prune.clone())?;
        let (pruned, stats) = janitor.prune(&graph);
        eprintln!("{}", formatter.format_prune_stats(&stats, janitor.config().dry_run)?);
        graph = pruned;
    }

    match &args.output {
        Some(path) => {
            write_graph_file(path, &graph)?;
            println!("{}", formatter.format_report(&report)?);
            println!("{}", formatter.success(&format!("Graph written to {}", path.display())));
        }
        None => {
            println!("{}", export_graph_json(&graph)?);
            eprintln!("{}", formatter.format_report(&report)?);
        }
    }
    Ok(())
}

/// Merge file configuration with command-line overrides.
fn pipeline_config(args: &ExtractArgs, config: &Config) -> Result<PipelineConfig> {
    let mut pipeline = config.pipeline.clone();
    if let Some(mode) = args.mode {
        pipeline.mode = mode.into();
    }
    if let Some(concurrency) = args.concurrency {
        pipeline.concurrency = concurrency;
    }
    if let Some(granularity) = &args.granularity {
        pipeline.extractor.granularity = parse_granularity(granularity)?;
    }
    if let Some(every) = args.snapshot_every {
        pipeline.snapshot_every = every;
    }
    if args.single_pass {
        pipeline.phase_aware = false;
    }
    if args.align {
        pipeline.align_concepts = true;
    }
    pipeline.validate().map_err(CliError::Config)?;
    Ok(pipeline)
}

fn build_oracle(settings: &OracleSettings, args: &ExtractArgs) -> Result<Arc<dyn ExtractionOracle>> {
    let provider = args.provider.map(Into::into).unwrap_or(settings.provider);
    let model = args.model.clone().unwrap_or_else(|| settings.model.clone());
    let endpoint = args.endpoint.clone().or_else(|| settings.endpoint.clone());

    let oracle: Arc<dyn ExtractionOracle> = match provider {
        Provider::Ollama => {
            let oracle = match endpoint {
                Some(endpoint) => OllamaOracle::new(endpoint, model),
                None => OllamaOracle::default_endpoint(model),
            };
            Arc::new(
                oracle
                    .with_max_retries(settings.max_retries)
                    .with_timeout(settings.timeout_secs),
            )
        }
        Provider::OpenAi => {
            let api_key = args
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| CliError::Config("OpenAI provider requires --api-key or TEXKG_API_KEY".into()))?;
            let base_url = endpoint.unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string());
            Arc::new(OpenAiOracle::new(base_url, api_key, model).with_timeout(settings.timeout_secs))
        }
    };
    info!("Using oracle {}", oracle.model_name());
    Ok(oracle)
}

async fn log_progress(mut rx: watch::Receiver<PipelineProgress>) {
    while rx.changed().await.is_ok() {
        let (status, done, total) = {
            let p = rx.borrow_and_update();
            (p.status, p.done_chunks, p.total_chunks)
        };
        if status == PipelineStatus::Extracting && total > 0 {
            info!("Progress: {}/{}", done, total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn extract_args(argv: &[&str]) -> ExtractArgs {
        let mut full = vec!["texkg", "extract", "in/"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Extract(args) => args,
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_flags_override_file() {
        let mut config = Config::default();
        config.pipeline.concurrency = 2;
        let args = extract_args(&["-m", "oracle", "-j", "16", "-g", "chapter", "--single-pass", "--align"]);

        let pipeline = pipeline_config(&args, &config).unwrap();
        assert_eq!(pipeline.mode, ExtractionMode::Oracle);
        assert_eq!(pipeline.concurrency, 16);
        assert_eq!(pipeline.extractor.granularity, texkg_domain::ChunkGranularity::Chapter);
        assert!(!pipeline.phase_aware);
        assert!(pipeline.align_concepts);
    }

    #[test]
    fn test_file_values_kept_without_flags() {
        let mut config = Config::default();
        config.pipeline.snapshot_every = 3;
        let pipeline = pipeline_config(&extract_args(&[]), &config).unwrap();
        assert_eq!(pipeline, config.pipeline);
    }

    #[test]
    fn test_bad_granularity() {
        let result = pipeline_config(&extract_args(&["-g", "chunky"]), &Config::default());
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_openai_needs_key() {
        let mut args = extract_args(&["--provider", "openai"]);
        args.api_key = None;
        let result = build_oracle(&OracleSettings::default(), &args);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_ollama_oracle_uses_model() {
        let args = extract_args(&["--model", "llama3.1"]);
        let oracle = build_oracle(&OracleSettings::default(), &args).unwrap();
        assert_eq!(oracle.model_name(), "llama3.1");
    }
}
