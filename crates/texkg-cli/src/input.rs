//! Loading LaTeX sources from disk.

use crate::error::{CliError, Result};
use std::fs;
use std::path::Path;
use texkg_domain::SourceFile;
use tracing::debug;
use walkdir::WalkDir;

/// Read `.tex` sources from a file or a directory tree.
///
/// Paths are recorded relative to the directory, with `/` separators, so the
/// same tree yields the same chunk ids on every platform.
pub fn load_sources(path: &Path) -> Result<Vec<SourceFile>> {
    if path.is_file() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        return Ok(vec![SourceFile::new(name, fs::read_to_string(path)?)]);
    }
    if !path.is_dir() {
        return Err(CliError::InvalidInput(format!("{} does not exist", path.display())));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry.map_err(|e| CliError::Io(e.into()))?;
        if !entry.file_type().is_file() || !is_tex(entry.path()) {
            continue;
        }
        let relative = entry.path().strip_prefix(path).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        debug!("Reading {}", name);
        files.push(SourceFile::new(name, fs::read_to_string(entry.path())?));
    }

    if files.is_empty() {
        return Err(CliError::InvalidInput(format!("no .tex files under {}", path.display())));
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn is_tex(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("tex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_tree() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("ch1")).unwrap();
        fs::write(dir.path().join("main.tex"), "\\section{A}").unwrap();
        fs::write(dir.path().join("ch1").join("limits.TEX"), "\\section{B}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = load_sources(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["ch1/limits.TEX", "main.tex"]);
    }

    #[test]
    fn test_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paper.tex");
        fs::write(&path, "text").unwrap();
        let files = load_sources(&path).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "paper.tex");
    }

    #[test]
    fn test_empty_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(load_sources(dir.path()), Err(CliError::InvalidInput(_))));
    }
}
