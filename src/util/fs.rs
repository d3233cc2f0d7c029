//! Filesystem utilities.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Replace a file's contents atomically.
///
/// The contents are written to a temporary file in the same directory and
/// renamed over the target. On failure the original file is untouched.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write temporary file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to flush temporary file for {}", path.display()))?;

    if let Ok(meta) = fs::metadata(path) {
        // Keep the original permissions on the replacement.
        if let Err(e) = fs::set_permissions(tmp.path(), meta.permissions()) {
            tracing::debug!("failed to copy permissions of {}: {}", path.display(), e);
        }
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in
            glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Check whether a pattern contains glob metacharacters.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Recursively list files under `root` whose extension is in `extensions`.
///
/// Results are sorted by path. A missing root yields an empty list.
pub fn files_with_extensions(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("failed to walk {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| extensions.iter().any(|e| ext == e.as_str()))
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    files
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a path with forward slashes, for stable artifacts.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
