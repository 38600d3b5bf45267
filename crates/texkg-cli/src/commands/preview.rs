//! Preview command implementation.

use super::parse_granularity;
use crate::cli::PreviewArgs;
use crate::config::Config;
use crate::error::Result;
use crate::input::load_sources;
use crate::output::Formatter;
use texkg_extractor::LatexSegmenter;

/// Execute the preview command.
pub fn execute_preview(args: PreviewArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let extractor = &config.pipeline.extractor;
    let granularity = match &args.granularity {
        Some(raw) => parse_granularity(raw)?,
        None => extractor.granularity,
    };
    let titles = args.titles.unwrap_or(extractor.preview_titles);

    let files = load_sources(&args.input)?;
    let preview = LatexSegmenter::new(granularity, extractor.token_budget()).preview(&files, titles);
    println!("{}", formatter.format_preview(&preview)?);
    Ok(())
}
