//! Source line lookup and path display helpers

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Lazily loaded source files, keyed by path
#[derive(Debug, Default)]
pub struct SourceCache {
    files: HashMap<PathBuf, Option<Vec<String>>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stripped text of 1-indexed `lineno` in `path`, or an empty string
    /// when the file cannot be read or is too short.
    pub fn line(&mut self, path: &Path, lineno: u32) -> String {
        let lines = self
            .files
            .entry(path.to_path_buf())
            .or_insert_with(|| match std::fs::read_to_string(path) {
                Ok(content) => Some(content.lines().map(str::to_string).collect()),
                Err(e) => {
                    log::debug!("source unavailable for {}: {}", path.display(), e);
                    None
                }
            });

        lines
            .as_ref()
            .and_then(|lines| lines.get((lineno as usize).checked_sub(1)?))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
}

/// `path` relative to the current working directory, falling back to the
/// path as given.
pub fn relative_path(path: &Path) -> String {
    if path.is_relative() {
        return path.display().to_string();
    }

    std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
