//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use texkg_domain::SnapshotMeta;
use texkg_extractor::ChunkPreview;
use texkg_janitor::PruneStats;
use texkg_pipeline::{PipelineReport, PipelineStatus};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Active output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format an extraction report.
    pub fn format_report(&self, report: &PipelineReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(format!("{} {}", report.nodes, report.edges)),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Status", "Chunks", "Nodes", "Edges", "Merged", "Snapshots", "Warnings"]);
                builder.push_record([
                    report.status.to_string(),
                    report.chunks.to_string(),
                    report.nodes.to_string(),
                    report.edges.to_string(),
                    report.merged_concepts.to_string(),
                    report.snapshots_saved.to_string(),
                    report.warnings.len().to_string(),
                ]);
                let table = self.table(builder);
                let headline = match report.status {
                    PipelineStatus::Done => self.success(&report.message),
                    _ => self.warning(&report.message),
                };
                Ok(format!("{}\n{}", table, headline))
            }
        }
    }

    /// Format a chunking preview.
    pub fn format_preview(&self, preview: &ChunkPreview) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(preview)?),
            OutputFormat::Quiet => Ok(preview.total_chunks.to_string()),
            OutputFormat::Table => {
                if preview.total_chunks == 0 {
                    return Ok(self.colorize("No chunks.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["#", "Title"]);
                for (i, title) in preview.titles.iter().enumerate() {
                    builder.push_record([(i + 1).to_string(), title.clone()]);
                }
                let table = self.table(builder);
                let more = preview.total_chunks.saturating_sub(preview.titles.len());
                let footer = if more > 0 {
                    format!("{} chunks ({} more not shown)", preview.total_chunks, more)
                } else {
                    format!("{} chunks", preview.total_chunks)
                };
                Ok(format!("{}\n{}", table, self.info(&footer)))
            }
        }
    }

    /// Format snapshot listings.
    pub fn format_snapshots(&self, snapshots: &[SnapshotMeta]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(snapshots)?),
            OutputFormat::Quiet => Ok(snapshots
                .iter()
                .map(|s| s.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if snapshots.is_empty() {
                    return Ok(self.colorize("No snapshots found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Created (ms)", "Nodes", "Edges", "Note"]);
                for s in snapshots {
                    builder.push_record([
                        s.id.to_string(),
                        s.created_at.to_string(),
                        s.nodes.to_string(),
                        s.edges.to_string(),
                        s.note.clone().unwrap_or_default(),
                    ]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format pruning statistics.
    pub fn format_prune_stats(&self, stats: &PruneStats, dry_run: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
            OutputFormat::Quiet => Ok(stats.dropped_node_ids.join("\n")),
            OutputFormat::Table => {
                let prefix = if dry_run { "Would drop" } else { "Dropped" };
                let line = format!(
                    "{} {} of {} candidate formulas ({} edges)",
                    prefix,
                    stats.dropped_node_count(),
                    stats.candidates,
                    stats.dropped_edge_count
                );
                if stats.is_noop() {
                    Ok(self.info("Nothing to prune"))
                } else {
                    Ok(format!("{}\n{}", self.success(&line), stats.summary()))
                }
            }
        }
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> PipelineReport {
        PipelineReport {
            status: PipelineStatus::Done,
            chunks: 3,
            commit_order: vec![0, 1, 2],
            warnings: vec!["chunk 1 failed: timeout".to_string()],
            nodes: 12,
            edges: 7,
            merged_concepts: 2,
            snapshots_saved: 0,
            message: "Extraction complete (oracle)".to_string(),
        }
    }

    #[test]
    fn test_report_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_report(&report()).unwrap();
        assert!(output.contains("Merged"));
        assert!(output.contains("✓ Extraction complete (oracle)"));
    }

    #[test]
    fn test_report_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_report(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["mergedConcepts"], 2);
        assert_eq!(value["status"], "done");
    }

    #[test]
    fn test_report_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(formatter.format_report(&report()).unwrap(), "12 7");
    }

    #[test]
    fn test_preview_footer() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let preview = ChunkPreview {
            total_chunks: 5,
            titles: vec!["a.tex / Intro".to_string(), "a.tex / Limits".to_string()],
        };
        let output = formatter.format_preview(&preview).unwrap();
        assert!(output.contains("a.tex / Limits"));
        assert!(output.contains("5 chunks (3 more not shown)"));
    }

    #[test]
    fn test_empty_snapshots() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_snapshots(&[]).unwrap();
        assert!(output.contains("No snapshots found"));
    }

    #[test]
    fn test_prune_stats_dry_run() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let stats = PruneStats {
            dropped_node_ids: vec!["f1".to_string()],
            dropped_edge_count: 1,
            candidates: 4,
        };
        let output = formatter.format_prune_stats(&stats, true).unwrap();
        assert!(output.starts_with("✓ Would drop 1 of 4 candidate formulas (1 edges)"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.warning("test"), "⚠ test");
    }
}
