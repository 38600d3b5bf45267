//! Prune command implementation.

use crate::cli::PruneArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use texkg_janitor::{Janitor, JanitorConfig};
use texkg_store::{read_graph_file, write_graph_file};

/// Execute the prune command.
pub fn execute_prune(args: PruneArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let janitor = Janitor::try_new(janitor_config(&args, &config.prune))?;
    let graph = read_graph_file(&args.input)?;
    let (pruned, stats) = janitor.prune(&graph);

    println!("{}", formatter.format_prune_stats(&stats, janitor.config().dry_run)?);
    if janitor.config().dry_run || stats.is_noop() {
        return Ok(());
    }

    let output = args.output.as_ref().unwrap_or(&args.input);
    write_graph_file(output, &pruned)?;
    println!("{}", formatter.success(&format!("Graph written to {}", output.display())));
    Ok(())
}

fn janitor_config(args: &PruneArgs, base: &JanitorConfig) -> JanitorConfig {
    let mut config = base.clone();
    if let Some(min) = args.min_len {
        config.min_formula_content_len = min;
    }
    if args.keep_templates {
        config.drop_templates = false;
    }
    if args.keep_problem_indexed {
        config.drop_problem_indexed = false;
    }
    config.dry_run |= args.dry_run;
    config
}
