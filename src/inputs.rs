//! Expanding command-line inputs into the ordered image list.
//!
//! Files are taken as given, in argument order, whatever their extension (a
//! bad file fails later with its index). Directories contribute their
//! supported images, sorted by path, hidden entries skipped. Only the top
//! level of a directory is read unless `recursive` is set.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read directory: {0}")]
    Walk(#[from] walkdir::Error),
}

pub fn is_supported_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Image files under `dir`, sorted.
pub fn images_in_dir(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, InputError> {
    let walker = if recursive {
        WalkDir::new(dir).follow_links(true)
    } else {
        WalkDir::new(dir).max_depth(1)
    };
    let mut images = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()))
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    images.sort();
    Ok(images)
}

/// Expand every input in order.
pub fn expand_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, InputError> {
    let mut images = Vec::new();
    for input in inputs {
        if input.is_dir() {
            images.extend(images_in_dir(input, recursive)?);
        } else if input.is_file() {
            images.push(input.clone());
        } else {
            return Err(InputError::NotFound(input.clone()));
        }
    }
    Ok(images)
}
