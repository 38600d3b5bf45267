//! Snapshots command implementation.

use crate::cli::{SnapshotAction, SnapshotsArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::io::{self, Write};
use std::path::PathBuf;
use texkg_domain::{SnapshotId, SnapshotStore};
use texkg_store::{export_graph_json, write_graph_file, SqliteSnapshotStore};

/// Execute the snapshots command.
pub fn execute_snapshots(args: SnapshotsArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let path = config.snapshot_db_path()?;
    if !path.exists() {
        println!("{}", formatter.info(&format!("No snapshot database at {}", path.display())));
        return Ok(());
    }
    let mut store = SqliteSnapshotStore::new(&path)?;

    match args.action {
        SnapshotAction::List => {
            println!("{}", formatter.format_snapshots(&store.list()?)?);
        }
        SnapshotAction::Load { id, output } => load(&store, &id, output, formatter)?,
        SnapshotAction::Clear { keep_latest, yes } => {
            if !yes {
                let what = if keep_latest { "all but the newest snapshot" } else { "all snapshots" };
                print!("About to delete {} in {}. Continue? [y/N] ", what, path.display());
                io::stdout().flush()?;

                let mut response = String::new();
                io::stdin().read_line(&mut response)?;
                if !response.trim().eq_ignore_ascii_case("y") {
                    println!("{}", formatter.info("Operation cancelled"));
                    return Ok(());
                }
            }
            let removed = if keep_latest {
                store.delete_all_but_latest()?
            } else {
                store.delete_all()?
            };
            println!("{}", formatter.success(&format!("Deleted {} snapshot(s)", removed)));
        }
    }
    Ok(())
}

fn load(store: &SqliteSnapshotStore, raw_id: &str, output: Option<PathBuf>, formatter: &Formatter) -> Result<()> {
    let id: SnapshotId = raw_id
        .trim()
        .parse()
        .map_err(|e| CliError::InvalidInput(format!("Invalid snapshot id '{}': {}", raw_id, e)))?;
    let snapshot = store
        .load(id)?
        .ok_or_else(|| CliError::InvalidInput(format!("Snapshot {} not found", raw_id)))?;

    match output {
        Some(path) => {
            write_graph_file(&path, &snapshot.graph)?;
            println!(
                "{}",
                formatter.success(&format!(
                    "Snapshot {} ({} nodes, {} edges) written to {}",
                    snapshot.meta.id,
                    snapshot.meta.nodes,
                    snapshot.meta.edges,
                    path.display()
                ))
            );
        }
        None => println!("{}", export_graph_json(&snapshot.graph)?),
    }
    Ok(())
}
