//! Output file naming.
//!
//! A thumbnail is written as `<name>.png` in the output directory. When no
//! name is given it defaults to `youtube-thumbnail-<layout>-<timestamp>`, with
//! the UTC timestamp formatted filename-safe (`2024-05-01T13-45-09`).
//!
//! User-supplied names are reduced to a single path component: separators and
//! characters that are reserved on common filesystems become `-`, and a
//! trailing `.png` is dropped so it is not doubled.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest output path accepted, in characters.
pub const MAX_PATH_LEN: usize = 260;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NamingError {
    #[error("Output path is {len} characters long (limit {MAX_PATH_LEN}): {path}")]
    PathTooLong { path: String, len: usize },
}

/// `youtube-thumbnail-<layout>-<YYYY-MM-DDTHH-MM-SS>`.
pub fn default_output_name(layout: &str, at: DateTime<Utc>) -> String {
    format!(
        "youtube-thumbnail-{}-{}",
        sanitize_name(layout),
        at.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Make `name` safe to use as a file stem.
pub fn sanitize_name(name: &str) -> String {
    let trimmed = name.trim();
    let stem = trimmed
        .strip_suffix(".png")
        .or_else(|| trimmed.strip_suffix(".PNG"))
        .unwrap_or(trimmed);
    stem.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect::<String>()
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}

/// Full path of the PNG to write.
///
/// Uses `name` when it is non-empty after sanitising, otherwise the default
/// name for `layout` at time `at`.
pub fn output_path(
    dir: &Path,
    name: Option<&str>,
    layout: &str,
    at: DateTime<Utc>,
) -> Result<PathBuf, NamingError> {
    let stem = name
        .map(sanitize_name)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_output_name(layout, at));
    let path = dir.join(format!("{stem}.png"));

    let display = path.display().to_string();
    let len = display.chars().count();
    if len > MAX_PATH_LEN {
        return Err(NamingError::PathTooLong { path: display, len });
    }
    Ok(path)
}
