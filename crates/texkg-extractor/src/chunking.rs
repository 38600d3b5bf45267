//! Section-aware segmentation of LaTeX sources

use crate::latex::{normalize_whitespace, strip_comments};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;
use texkg_domain::{ChunkGranularity, LatexChunk, SourceFile};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\\(chapter|section|subsection|subsubsection|paragraph|subparagraph)\*?\{(.+?)\}\s*$")
        .expect("valid regex")
});

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\[a-zA-Z]+|[a-zA-Z0-9_]+|[\x{4e00}-\x{9fff}]|[^\s]").expect("valid regex")
});

/// Chunk count and a handful of display titles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPreview {
    /// Number of chunks the segmenter would emit
    pub total_chunks: usize,
    /// First distinct display titles
    pub titles: Vec<String>,
}

#[derive(Debug, Clone)]
struct Heading {
    level: u8,
    title: String,
}

struct Bucket {
    key: String,
    title: String,
    section_path: Vec<String>,
}

/// Splits LaTeX files into section-aware chunks
#[derive(Debug, Clone)]
pub struct LatexSegmenter {
    granularity: ChunkGranularity,
    max_tokens: Option<usize>,
}

impl LatexSegmenter {
    /// Create a segmenter; a `max_tokens` of zero disables windowing
    pub fn new(granularity: ChunkGranularity, max_tokens: Option<usize>) -> Self {
        Self {
            granularity,
            max_tokens: max_tokens.filter(|&n| n > 0),
        }
    }

    /// Active granularity
    pub fn granularity(&self) -> ChunkGranularity {
        self.granularity
    }

    /// Segment files into chunks
    ///
    /// Files are visited in lexicographic path order. The output depends only
    /// on file contents, granularity and token budget.
    pub fn segment(&self, files: &[SourceFile]) -> Vec<LatexChunk> {
        let mut sorted: Vec<&SourceFile> = files.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));

        let mut chunks = Vec::new();
        for file in sorted {
            self.segment_file(file, &mut chunks);
        }

        match self.max_tokens {
            Some(max) => split_oversized(chunks, max),
            None => chunks,
        }
    }

    /// Chunk count plus up to `max_titles` distinct display titles
    pub fn preview(&self, files: &[SourceFile], max_titles: usize) -> ChunkPreview {
        let chunks = self.segment(files);
        let mut seen = HashSet::new();
        let mut titles = Vec::new();
        for chunk in &chunks {
            if titles.len() >= max_titles {
                break;
            }
            let title = chunk.display_title();
            if seen.insert(title.clone()) {
                titles.push(title);
            }
        }
        ChunkPreview {
            total_chunks: chunks.len(),
            titles,
        }
    }

    fn segment_file(&self, file: &SourceFile, chunks: &mut Vec<LatexChunk>) {
        let cleaned = strip_comments(&file.content);
        let mut stack: Vec<Heading> = Vec::new();
        let mut buf: Vec<&str> = Vec::new();
        let mut current: Option<Bucket> = None;

        for line in cleaned.split('\n') {
            if let Some(caps) = HEADING_RE.captures(line) {
                let level = ChunkGranularity::level_of_command(&caps[1]).unwrap_or(5);
                let title = normalize_whitespace(&caps[2]);
                while stack.last().is_some_and(|h| h.level >= level) {
                    stack.pop();
                }
                stack.push(Heading { level, title });
            }

            let next = self.bucket(&file.path, &stack);
            if let Some(cur) = &current {
                if cur.key != next.key {
                    flush(file, cur, &mut buf, chunks);
                }
            }
            current = Some(next);
            buf.push(line);
        }

        if let Some(cur) = &current {
            flush(file, cur, &mut buf, chunks);
        }
    }

    /// Bucket for the current heading stack
    ///
    /// When the desired level is absent, the nearest shallower heading is used.
    fn bucket(&self, file: &str, stack: &[Heading]) -> Bucket {
        let desired = self.granularity.depth();
        if desired == 0 {
            return Bucket {
                key: format!("file:{}", file),
                title: file.to_string(),
                section_path: vec![file.to_string()],
            };
        }

        let chosen = stack
            .iter()
            .find(|h| h.level == desired)
            .or_else(|| stack.iter().rev().find(|h| h.level < desired));
        let chosen_level = chosen.map_or(0, |h| h.level);
        let title = chosen.map_or_else(|| file.to_string(), |h| h.title.clone());

        let mut section_path = vec![file.to_string()];
        section_path.extend(
            stack
                .iter()
                .filter(|h| h.level <= chosen_level)
                .map(|h| h.title.clone()),
        );
        let key = format!("g:{}:{}:{}", file, chosen_level, section_path[1..].join(" / "));
        Bucket {
            key,
            title,
            section_path,
        }
    }
}

impl Default for LatexSegmenter {
    fn default() -> Self {
        Self::new(ChunkGranularity::default(), None)
    }
}

fn flush(file: &SourceFile, bucket: &Bucket, buf: &mut Vec<&str>, chunks: &mut Vec<LatexChunk>) {
    let text = buf.join("\n");
    buf.clear();
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    chunks.push(LatexChunk {
        id: format!("chunk:{}:{}", file.path, chunks.len()),
        file: file.path.clone(),
        title: bucket.title.clone(),
        section_path: bucket.section_path.clone(),
        text: text.to_string(),
    });
}

/// Byte spans of approximate tokens
///
/// A token is a control word, an alphanumeric run, a single CJK ideograph,
/// or any other non-space character.
pub fn approx_token_spans(text: &str) -> Vec<Range<usize>> {
    TOKEN_RE.find_iter(text).map(|m| m.range()).collect()
}

/// Replace every chunk above `max_tokens` with half-overlapping windows
fn split_oversized(chunks: Vec<LatexChunk>, max_tokens: usize) -> Vec<LatexChunk> {
    let stride = (max_tokens / 2).max(1);
    let mut out = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let spans = approx_token_spans(&chunk.text);
        if spans.len() <= max_tokens {
            out.push(chunk);
            continue;
        }

        let mut start = 0;
        let mut window = 0;
        loop {
            let end = (start + max_tokens).min(spans.len());
            let slice = chunk.text[spans[start].start..spans[end - 1].end].trim();
            if !slice.is_empty() {
                out.push(LatexChunk {
                    id: format!("{}:w{}", chunk.id, window),
                    file: chunk.file.clone(),
                    title: chunk.title.clone(),
                    section_path: chunk.section_path.clone(),
                    text: slice.to_string(),
                });
                window += 1;
            }
            if end >= spans.len() {
                break;
            }
            start += stride;
        }
    }
    out
}
