//! Per-image feature extraction.
//!
//! Everything here is a pure function over buffers a [`RasterBackend`]
//! already produced: statistics, a grayscale dump and a small edge map. No
//! decoding and no I/O, so the layout rules can be tested against synthetic
//! numbers.
//!
//! ## Scales
//!
//! [`ChannelStats`] are kept on the 0–255 scale the backend reports.
//! [`analyze_color`] normalises to 0..1 before applying its exposure
//! thresholds, while [`visual_weight`] and [`color_variance`] stay on the
//! 0–255 scale (the layout selector's weight thresholds of 80 and 120 are
//! expressed in those units).
//!
//! [`RasterBackend`]: crate::imaging::RasterBackend

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Edge intensity above which a pixel of the edge map counts as an edge.
const EDGE_THRESHOLD: u8 = 50;

/// Center density must beat peripheral density by this factor.
const SUBJECT_DOMINANCE: f64 = 1.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid image statistics: expected at least 3 channels, got {0}")]
    InvalidStatistics(usize),
}

/// Statistics for one channel on the 0–255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stdev: f64,
}

/// Per-channel statistics in R, G, B(, A) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    pub channels: Vec<ChannelStats>,
}

impl ImageStats {
    /// The first three channels, or `None` when the statistics are malformed.
    fn rgb(&self) -> Option<&[ChannelStats]> {
        self.channels.get(..3)
    }
}

/// Exposure and colour summary used by the enhancement calculator.
///
/// Brightness, contrast and dynamic range are normalised to 0..1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorAnalysis {
    pub mean_brightness: f64,
    pub max_brightness: f64,
    pub min_brightness: f64,
    pub contrast: f64,
    pub color_cast: bool,
    pub saturation_level: f64,
    pub is_underexposed: bool,
    pub is_overexposed: bool,
    pub dynamic_range: f64,
    /// Normalised R, G, B means, kept for white-balance correction.
    pub channel_means: Vec<f64>,
}

/// Summarise exposure, contrast and colour cast from channel statistics.
///
/// Fails with [`AnalysisError::InvalidStatistics`] when fewer than three
/// channels are present.
pub fn analyze_color(stats: &ImageStats) -> Result<ColorAnalysis, AnalysisError> {
    let rgb = stats
        .rgb()
        .ok_or(AnalysisError::InvalidStatistics(stats.channels.len()))?;

    let means: Vec<f64> = rgb.iter().map(|c| c.mean / 255.0).collect();
    let mean_brightness = means.iter().sum::<f64>() / 3.0;
    let max_brightness = rgb.iter().map(|c| c.max / 255.0).fold(f64::MIN, f64::max);
    let min_brightness = rgb.iter().map(|c| c.min / 255.0).fold(f64::MAX, f64::min);
    let contrast = rgb.iter().map(|c| c.stdev / 255.0).sum::<f64>() / 3.0;

    let color_cast = means
        .iter()
        .map(|m| (m - mean_brightness).abs())
        .fold(0.0, f64::max)
        > 0.1;

    Ok(ColorAnalysis {
        mean_brightness,
        max_brightness,
        min_brightness,
        contrast,
        color_cast,
        saturation_level: saturation_level(stats),
        is_underexposed: mean_brightness < 0.3,
        is_overexposed: mean_brightness > 0.7,
        dynamic_range: max_brightness - min_brightness,
        channel_means: means,
    })
}

/// Chroma of the average colour: `(max - min) / max` over the R, G, B means.
pub fn saturation_level(stats: &ImageStats) -> f64 {
    let Some(rgb) = stats.rgb() else {
        return 0.0;
    };
    let max = rgb.iter().map(|c| c.mean).fold(f64::MIN, f64::max);
    let min = rgb.iter().map(|c| c.mean).fold(f64::MAX, f64::min);
    if max <= 0.0 { 0.0 } else { (max - min) / max }
}

/// Mean of the per-channel variances of R, G and B.
pub fn color_variance(stats: &ImageStats) -> f64 {
    match stats.rgb() {
        Some(rgb) => rgb.iter().map(|c| c.stdev.powi(2)).sum::<f64>() / 3.0,
        None => 0.0,
    }
}

/// Combined contrast and tonal spread: `(Σ stdev + Σ (max - min)) / 6`.
pub fn visual_weight(stats: &ImageStats) -> f64 {
    match stats.rgb() {
        Some(rgb) => {
            let contrast: f64 = rgb.iter().map(|c| c.stdev).sum();
            let spread: f64 = rgb.iter().map(|c| c.max - c.min).sum();
            (contrast + spread) / 6.0
        }
        None => 0.0,
    }
}

/// Shannon entropy (bits) of the byte histogram.
///
/// A constant buffer has entropy 0, a uniform spread over all 256 values has
/// entropy 8. Empty buffers report 0.
pub fn compute_entropy(buffer: &[u8]) -> f64 {
    if buffer.is_empty() {
        return 0.0;
    }
    let mut histogram = [0u64; 256];
    for &byte in buffer {
        histogram[byte as usize] += 1;
    }

    let total = buffer.len() as f64;
    histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Edge-pixel count and pixel count inside the square band `[start, end)` of both axes.
fn count_region_edges(
    buffer: &[u8],
    width: usize,
    height: usize,
    start: f64,
    end: f64,
) -> (usize, usize) {
    let (x0, x1) = (
        (width as f64 * start) as usize,
        (width as f64 * end) as usize,
    );
    let (y0, y1) = (
        (height as f64 * start) as usize,
        (height as f64 * end) as usize,
    );

    let mut edges = 0usize;
    for y in y0..y1 {
        edges += buffer[y * width + x0..y * width + x1]
            .iter()
            .filter(|&&v| v > EDGE_THRESHOLD)
            .count();
    }
    (edges, (x1 - x0) * (y1 - y0))
}

fn density(edges: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        edges as f64 / total as f64
    }
}

/// Whether the central 50%×50% of an edge map is markedly busier than the rest.
///
/// The periphery is the full frame minus the center band, counted in pixels.
/// Never fails: degenerate inputs (zero size, short buffer) report `false`.
pub fn detect_prominent_subject(edge_buffer: &[u8], width: u32, height: u32) -> bool {
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 || edge_buffer.len() < w * h {
        return false;
    }

    let (center_edges, center_total) = count_region_edges(edge_buffer, w, h, 0.25, 0.75);
    let (all_edges, all_total) = count_region_edges(edge_buffer, w, h, 0.0, 1.0);

    let center = density(center_edges, center_total);
    let peripheral = density(all_edges - center_edges, all_total - center_total);
    center > peripheral * SUBJECT_DOMINANCE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
    Square,
}

/// Portrait below 0.9, landscape above 1.1, square in between (inclusive).
pub fn classify_orientation(aspect_ratio: f64) -> Orientation {
    if aspect_ratio < 0.9 {
        Orientation::Portrait
    } else if aspect_ratio > 1.1 {
        Orientation::Landscape
    } else {
        Orientation::Square
    }
}

/// Everything the layout selector needs to know about one input image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageFeature {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub entropy: f64,
    pub color_variance: f64,
    pub visual_weight: f64,
    pub has_prominent_subject: bool,
    pub orientation: Orientation,
}

/// Small grayscale edge map produced by the backend for subject detection.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageFeature {
    /// Assemble a feature record from backend outputs.
    pub fn from_parts(
        path: impl Into<String>,
        dimensions: (u32, u32),
        stats: &ImageStats,
        grayscale: &[u8],
        edges: &EdgeMap,
    ) -> Self {
        let (width, height) = dimensions;
        let aspect_ratio = if height == 0 {
            1.0
        } else {
            width as f64 / height as f64
        };

        Self {
            path: path.into(),
            width,
            height,
            aspect_ratio,
            entropy: compute_entropy(grayscale),
            color_variance: color_variance(stats),
            visual_weight: visual_weight(stats),
            has_prominent_subject: detect_prominent_subject(&edges.buffer, edges.width, edges.height),
            orientation: classify_orientation(aspect_ratio),
        }
    }
}
