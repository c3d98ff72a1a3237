//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity (input image, arrangement, result) leads with its identity
//! (positional index, arrangement id) and shows paths and numbers as indented
//! context lines underneath.
//!
//! # Output Format
//!
//! ## Analyze
//!
//! ```text
//! Images
//! 001 beach.jpg
//!     Size: 4000×3000 (landscape, 1.33)
//!     Entropy: 7.12  Weight: 96.4  Subject: yes
//!
//! Layout: 1x2 (confidence 0.90)
//!     Images: 2 (1 landscape, 1 square, 0 portrait)
//!     Mean aspect: 1.17  Variance: 0.03
//! ```
//!
//! ## Create
//!
//! ```text
//! Created thumbnails/launch.png
//!     Layout: 1x2 (confidence 0.90)
//!     Images used: 2
//!     Time: 412 ms
//!     Optimized: 1.2 MB → 1.1 MB (8.3% saved)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::analysis::{ImageFeature, Orientation};
use crate::compose::{OptimizationResult, ThumbnailResult};
use crate::layout::{ArrangementKind, Catalog, LayoutDecision};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn orientation_name(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Portrait => "portrait",
        Orientation::Landscape => "landscape",
        Orientation::Square => "square",
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Human-readable byte count: `512 B`, `1.5 KB`, `2.3 MB`.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn format_optimization(opt: &OptimizationResult) -> String {
    format!(
        "Optimized: {} → {} ({:.1}% saved)",
        format_bytes(opt.original_size),
        format_bytes(opt.optimized_size),
        opt.savings_percent
    )
}

// ============================================================================
// Analyze
// ============================================================================

/// Per-image feature listing.
pub fn format_features(features: &[ImageFeature]) -> Vec<String> {
    let mut lines = vec!["Images".to_string()];
    for (i, f) in features.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), file_name(&f.path)));
        lines.push(format!(
            "{}Size: {}×{} ({}, {:.2})",
            indent(1),
            f.width,
            f.height,
            orientation_name(f.orientation),
            f.aspect_ratio
        ));
        lines.push(format!(
            "{}Entropy: {:.2}  Weight: {:.1}  Subject: {}",
            indent(1),
            f.entropy,
            f.visual_weight,
            if f.has_prominent_subject { "yes" } else { "no" }
        ));
    }
    lines
}

/// The selector's decision with its aggregate metrics.
pub fn format_decision(decision: &LayoutDecision) -> Vec<String> {
    let mut lines = vec![format!(
        "Layout: {} (confidence {:.2}{})",
        decision.arrangement_id,
        decision.confidence,
        if decision.fallback { ", fallback" } else { "" }
    )];
    if let Some(m) = &decision.metrics {
        lines.push(format!(
            "{}Images: {} ({} landscape, {} square, {} portrait)",
            indent(1),
            m.image_count,
            m.landscape,
            m.square,
            m.portrait
        ));
        lines.push(format!(
            "{}Mean aspect: {:.2}  Variance: {:.2}",
            indent(1),
            m.mean_aspect_ratio,
            m.aspect_variance
        ));
        lines.push(format!(
            "{}Mean entropy: {:.2}  Mean weight: {:.1}  Subjects: {}",
            indent(1),
            m.mean_entropy,
            m.mean_visual_weight,
            m.prominent_subjects
        ));
    }
    if let Some(err) = &decision.error {
        lines.push(format!("{}Note: {}", indent(1), err));
    }
    lines
}

pub fn print_analysis(decision: &LayoutDecision) {
    if let Some(m) = &decision.metrics {
        for line in format_features(&m.features) {
            println!("{}", line);
        }
        println!();
    }
    for line in format_decision(decision) {
        println!("{}", line);
    }
}

// ============================================================================
// Layouts
// ============================================================================

/// Catalog listing, one line per arrangement.
pub fn format_catalog(catalog: &Catalog) -> Vec<String> {
    catalog
        .iter()
        .map(|spec| {
            let kind = match spec.kind {
                ArrangementKind::Grid { rows, cols } => format!("grid {rows}×{cols}"),
                ArrangementKind::Custom { .. } => "custom".to_string(),
            };
            let plural = if spec.max_images == 1 { "" } else { "s" };
            format!("{:<14}{:<12}{} image{}", spec.id, kind, spec.max_images, plural)
        })
        .collect()
}

pub fn print_catalog(catalog: &Catalog) {
    for line in format_catalog(catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Create
// ============================================================================

/// Summary of a [`ThumbnailResult`].
pub fn format_result(result: &ThumbnailResult) -> Vec<String> {
    if !result.success {
        return vec![
            format!(
                "Failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            ),
            format!("{}Time: {} ms", indent(1), result.processing_time_ms),
        ];
    }

    let mut lines = Vec::new();
    match &result.output_path {
        Some(path) => lines.push(format!("Created {}", path.display())),
        None => lines.push("Created thumbnail".to_string()),
    }
    if let Some(layout) = &result.layout {
        match result.confidence {
            Some(c) => lines.push(format!("{}Layout: {} (confidence {:.2})", indent(1), layout, c)),
            None => lines.push(format!("{}Layout: {}", indent(1), layout)),
        }
    }
    lines.push(format!("{}Images used: {}", indent(1), result.images_used));
    lines.push(format!("{}Time: {} ms", indent(1), result.processing_time_ms));
    if let Some(opt) = &result.optimization {
        lines.push(format!("{}{}", indent(1), format_optimization(opt)));
    }
    lines
}

pub fn print_result(result: &ThumbnailResult) {
    for line in format_result(result) {
        println!("{}", line);
    }
}
