//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use walkdir::WalkDir;

use crate::util::errors::DeployError;

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    write_bytes(path, contents.as_bytes())
}

/// Write bytes to a file, creating parent directories if needed.
pub fn write_bytes(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Find the single path matching a glob pattern.
///
/// No match, or more than one, is a configuration error.
pub fn find_unique_match(pattern: &Path) -> Result<PathBuf> {
    let pattern_str = pattern.to_string_lossy();
    let mut matches = Vec::new();

    for entry in glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern_str))? {
        match entry {
            Ok(path) => matches.push(path),
            Err(e) => tracing::warn!("glob error: {}", e),
        }
    }

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(DeployError::config(format!("'{}' does not match any files", pattern_str)).into()),
        n => {
            matches.sort();
            let found: Vec<String> = matches.iter().map(|p| p.display().to_string()).collect();
            Err(DeployError::config_in(
                format!("'{}' matches {} files, expected one", pattern_str, n),
                found.join(", "),
            )
            .into())
        }
    }
}

/// Find every file with an extension below a directory, sorted, as paths
/// relative to the directory.
pub fn find_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry =
            entry.with_context(|| format!("failed to read directory: {}", root.display()))?;

        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|e| e == extension)
        {
            if let Ok(rel) = entry.path().strip_prefix(root) {
                files.push(rel.to_path_buf());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Join path components with forward slashes, as qmake and Qt resources
/// expect.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
