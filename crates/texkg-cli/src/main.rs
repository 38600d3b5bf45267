//! texkg CLI - extract a typed knowledge graph from LaTeX sources.

use anyhow::Context;
use clap::Parser;
use texkg_cli::commands;
use texkg_cli::{logging, Cli, Command, Config, Formatter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &config, &formatter).await?,
        Command::Preview(args) => commands::execute_preview(args, &config, &formatter)?,
        Command::Prune(args) => commands::execute_prune(args, &config, &formatter)?,
        Command::Snapshots(args) => commands::execute_snapshots(args, &config, &formatter)?,
    }

    Ok(())
}
