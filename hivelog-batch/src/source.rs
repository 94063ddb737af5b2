//! Game log discovery and loading
//!
//! Level 4 - Utilities

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BatchError;

/// Every file under `root` with the given extension, depth first and sorted.
///
/// Other files are logged and skipped.
pub fn discover_logs(root: &Path, extension: &str) -> Result<Vec<PathBuf>, BatchError> {
    let mut found = Vec::new();
    walk(root, extension, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, extension: &str, found: &mut Vec<PathBuf>) -> Result<(), BatchError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, extension, found)?;
        } else if path.extension().is_some_and(|e| e == extension) {
            found.push(path);
        } else {
            tracing::warn!(path = %path.display(), "not a game log, ignored");
        }
    }
    Ok(())
}

/// Read a log as Latin-1 text, one entry per line without line endings
pub fn read_log_lines(path: &Path) -> Result<Vec<String>, BatchError> {
    let bytes = fs::read(path)?;
    Ok(decode_lines(&bytes))
}

fn decode_lines(bytes: &[u8]) -> Vec<String> {
    // Every byte maps to the code point of the same value
    let text: String = bytes.iter().map(|&b| b as char).collect();
    text.lines().map(|l| l.trim_end_matches('\r').to_string()).collect()
}

/// Storage key of a log: its path relative to `root`, with `/` separators
pub fn game_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
