//! Segmentation input and output types

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A plain-text LaTeX source file supplied by the document source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path used for ordering and provenance
    pub path: String,
    /// Raw file content
    pub content: String,
}

impl SourceFile {
    /// Create a source file
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// An immutable, section-aware unit of extraction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatexChunk {
    /// Ordering/attribution id, never a node-identity input
    pub id: String,
    /// Originating file
    pub file: String,
    /// Deepest heading title (or the file name)
    pub title: String,
    /// `[file, heading, ...]`
    pub section_path: Vec<String>,
    /// Comment-stripped text
    pub text: String,
}

impl LatexChunk {
    /// Human-readable title: headings joined by ` / `, or the chunk title
    pub fn display_title(&self) -> String {
        if self.section_path.len() > 1 {
            self.section_path[1..].join(" / ")
        } else {
            self.title.clone()
        }
    }
}

/// Segmentation depth
///
/// `File` emits one chunk per file; the heading levels follow LaTeX sectioning
/// depth (`chapter` = 1 ... `paragraph`/`subparagraph` = 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkGranularity {
    /// Whole file
    File,
    /// `\chapter`
    Chapter,
    /// `\section`
    Section,
    /// `\subsection`
    Subsection,
    /// `\subsubsection`
    Subsubsection,
    /// `\paragraph` / `\subparagraph`
    Paragraph,
}

impl ChunkGranularity {
    /// Heading depth (0 for whole-file)
    pub fn depth(&self) -> u8 {
        match self {
            ChunkGranularity::File => 0,
            ChunkGranularity::Chapter => 1,
            ChunkGranularity::Section => 2,
            ChunkGranularity::Subsection => 3,
            ChunkGranularity::Subsubsection => 4,
            ChunkGranularity::Paragraph => 5,
        }
    }

    /// Heading depth of a sectioning command name
    pub fn level_of_command(command: &str) -> Option<u8> {
        match command {
            "chapter" => Some(1),
            "section" => Some(2),
            "subsection" => Some(3),
            "subsubsection" => Some(4),
            "paragraph" | "subparagraph" => Some(5),
            _ => None,
        }
    }
}

impl Default for ChunkGranularity {
    fn default() -> Self {
        ChunkGranularity::Section
    }
}

impl fmt::Display for ChunkGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChunkGranularity::File => "file",
            ChunkGranularity::Chapter => "chapter",
            ChunkGranularity::Section => "section",
            ChunkGranularity::Subsection => "subsection",
            ChunkGranularity::Subsubsection => "subsubsection",
            ChunkGranularity::Paragraph => "paragraph",
        };
        f.write_str(s)
    }
}

impl FromStr for ChunkGranularity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(ChunkGranularity::File),
            "chapter" => Ok(ChunkGranularity::Chapter),
            "section" => Ok(ChunkGranularity::Section),
            "subsection" => Ok(ChunkGranularity::Subsection),
            "subsubsection" => Ok(ChunkGranularity::Subsubsection),
            "paragraph" | "subparagraph" => Ok(ChunkGranularity::Paragraph),
            other => Err(DomainError::UnknownGranularity(other.to_string())),
        }
    }
}
