//! Automatic arrangement selection.
//!
//! The selector is two ordered rule tables evaluated top to bottom. The grid
//! table always produces a candidate (the last rule of every count bucket is
//! unconditional); the creative table may then propose a custom shape, which
//! wins only when its confidence is strictly higher. Rule order is the
//! tie-break order, so reordering entries changes behavior.
//!
//! | Images | Grid rule | Result | Confidence |
//! |---|---|---|---|
//! | 1 | always | `1x1` | 1.0 |
//! | 2 | both landscape, weight > 120, mean aspect > 2.0 | `2x1` | 0.8 |
//! | 2 | always | `1x2` | 0.9 |
//! | 3 | ≥ 2 portrait | `1x3` | 0.85 |
//! | 3 | aspect variance > 0.5 | `3x1` | 0.8 |
//! | 3 | always | `1x3` | 0.75 |
//! | 4 | ≥ 2 square, or mean aspect in 0.8..=1.2 | `2x2` | 0.9 |
//! | 4 | ≥ 3 portrait | `1x3` | 0.8 |
//! | 4 | always | `2x2` | 0.7 |
//! | 5–6 | prominent subjects ≥ 0.6·N | `2x3` | 0.8 |
//! | 5–6 | aspect variance > 0.5 | `3x2` | 0.75 |
//! | 5–6 | always | `2x3` | 0.7 |
//! | 7+ | always | `3x2` | 0.6 |

use super::catalog::Catalog;
use crate::analysis::{ImageFeature, Orientation};
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

/// Set-level statistics the rules are evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub image_count: usize,
    pub mean_aspect_ratio: f64,
    pub aspect_variance: f64,
    pub mean_entropy: f64,
    pub mean_visual_weight: f64,
    pub portrait: usize,
    pub landscape: usize,
    pub square: usize,
    pub prominent_subjects: usize,
    pub features: Vec<ImageFeature>,
}

impl AggregateMetrics {
    pub fn from_features(features: &[ImageFeature]) -> Self {
        let n = features.len().max(1) as f64;
        let mean = |f: fn(&ImageFeature) -> f64| features.iter().map(f).sum::<f64>() / n;
        let count = |o: Orientation| features.iter().filter(|f| f.orientation == o).count();

        let mean_aspect_ratio = mean(|f| f.aspect_ratio);
        let aspect_variance = features
            .iter()
            .map(|f| (f.aspect_ratio - mean_aspect_ratio).powi(2))
            .sum::<f64>()
            / n;

        Self {
            image_count: features.len(),
            mean_aspect_ratio,
            aspect_variance,
            mean_entropy: mean(|f| f.entropy),
            mean_visual_weight: mean(|f| f.visual_weight),
            portrait: count(Orientation::Portrait),
            landscape: count(Orientation::Landscape),
            square: count(Orientation::Square),
            prominent_subjects: features.iter().filter(|f| f.has_prominent_subject).count(),
            features: features.to_vec(),
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.mean_aspect_ratio,
            self.aspect_variance,
            self.mean_entropy,
            self.mean_visual_weight,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// The selector's answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutDecision {
    pub arrangement_id: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<AggregateMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when the decision came from a fallback rather than the tables.
    pub fallback: bool,
}

impl LayoutDecision {
    fn fallback(id: &str, confidence: f64, metrics: Option<AggregateMetrics>, error: Option<String>) -> Self {
        Self {
            arrangement_id: id.to_string(),
            confidence,
            metrics,
            error,
            fallback: true,
        }
    }
}

struct Rule {
    count: RangeInclusive<usize>,
    when: fn(&AggregateMetrics) -> bool,
    arrangement: &'static str,
    confidence: f64,
}

impl Rule {
    fn matches(&self, m: &AggregateMetrics) -> bool {
        self.count.contains(&m.image_count) && (self.when)(m)
    }
}

fn always(_: &AggregateMetrics) -> bool {
    true
}

static GRID_RULES: &[Rule] = &[
    Rule { count: 1..=1, when: always, arrangement: "1x1", confidence: 1.0 },
    Rule {
        count: 2..=2,
        when: |m| m.landscape == 2 && m.mean_visual_weight > 120.0 && m.mean_aspect_ratio > 2.0,
        arrangement: "2x1",
        confidence: 0.8,
    },
    Rule { count: 2..=2, when: always, arrangement: "1x2", confidence: 0.9 },
    Rule { count: 3..=3, when: |m| m.portrait >= 2, arrangement: "1x3", confidence: 0.85 },
    Rule { count: 3..=3, when: |m| m.aspect_variance > 0.5, arrangement: "3x1", confidence: 0.8 },
    Rule { count: 3..=3, when: always, arrangement: "1x3", confidence: 0.75 },
    Rule {
        count: 4..=4,
        when: |m| m.square >= 2 || (0.8..=1.2).contains(&m.mean_aspect_ratio),
        arrangement: "2x2",
        confidence: 0.9,
    },
    // Drops the fourth image; kept for compatibility, usually beaten by `spotlight`.
    Rule { count: 4..=4, when: |m| m.portrait >= 3, arrangement: "1x3", confidence: 0.8 },
    Rule { count: 4..=4, when: always, arrangement: "2x2", confidence: 0.7 },
    Rule {
        count: 5..=6,
        when: |m| m.prominent_subjects as f64 >= 0.6 * m.image_count as f64,
        arrangement: "2x3",
        confidence: 0.8,
    },
    Rule { count: 5..=6, when: |m| m.aspect_variance > 0.5, arrangement: "3x2", confidence: 0.75 },
    Rule { count: 5..=6, when: always, arrangement: "2x3", confidence: 0.7 },
    Rule { count: 7..=usize::MAX, when: always, arrangement: "3x2", confidence: 0.6 },
];

static CREATIVE_RULES: &[Rule] = &[
    Rule {
        count: 3..=3,
        when: |m| m.mean_aspect_ratio > 1.5 && m.prominent_subjects >= 1,
        arrangement: "banner-split",
        confidence: 0.88,
    },
    Rule {
        count: 4..=4,
        when: |m| m.prominent_subjects >= 1 && m.aspect_variance > 0.3,
        arrangement: "hero-side",
        confidence: 0.85,
    },
    Rule { count: 4..=4, when: |m| m.mean_aspect_ratio < 0.9, arrangement: "spotlight", confidence: 0.85 },
    Rule { count: 5..=5, when: |m| m.prominent_subjects >= 1, arrangement: "corner-grid", confidence: 0.85 },
    Rule { count: 5..=5, when: |m| m.aspect_variance > 0.5, arrangement: "l-shape", confidence: 0.8 },
];

/// Grids chosen when metrics are unusable, by image count.
pub fn fallback_for_count(count: usize) -> &'static str {
    match count {
        1 => "1x1",
        2 => "1x2",
        4 => "2x2",
        n if n >= 5 => "2x3",
        _ => "1x3",
    }
}

/// Pick an arrangement for the successfully analyzed images.
///
/// An empty slice means every analysis failed; the decision is then `1x3`
/// at confidence 0.
pub fn select_layout(features: &[ImageFeature], catalog: &Catalog) -> LayoutDecision {
    if features.is_empty() {
        return LayoutDecision::fallback(
            "1x3",
            0.0,
            None,
            Some("no image could be analyzed".to_string()),
        );
    }

    let metrics = AggregateMetrics::from_features(features);
    if !metrics.is_finite() {
        warn!(count = metrics.image_count, "Non-finite image metrics, using count fallback");
        return LayoutDecision::fallback(
            fallback_for_count(metrics.image_count),
            0.0,
            Some(metrics),
            Some("image metrics are not finite".to_string()),
        );
    }

    let (mut arrangement, mut confidence) = GRID_RULES
        .iter()
        .find(|r| r.matches(&metrics))
        .map(|r| (r.arrangement, r.confidence))
        .unwrap_or(("1x3", 0.5));

    if metrics.mean_entropy > 6.5 && metrics.mean_visual_weight > 80.0 {
        confidence = (confidence + 0.1).min(1.0);
    }

    if metrics.image_count >= 3 && confidence < 0.9 {
        if let Some(rule) = CREATIVE_RULES.iter().find(|r| r.matches(&metrics)) {
            if rule.confidence > confidence {
                debug!(
                    grid = arrangement,
                    creative = rule.arrangement,
                    "Creative arrangement outranks grid"
                );
                arrangement = rule.arrangement;
                confidence = rule.confidence;
            }
        }
    }

    if metrics.image_count == 4 && arrangement == "1x3" {
        warn!("Four images mapped to 1x3; the last image will not be shown");
    }

    if !catalog.contains(arrangement) {
        let id = if metrics.image_count <= 3 { "1x3" } else { "2x2" };
        warn!(arrangement, fallback = id, "Selected arrangement missing from catalog");
        return LayoutDecision::fallback(id, 0.5, Some(metrics), None);
    }

    LayoutDecision {
        arrangement_id: arrangement.to_string(),
        confidence,
        metrics: Some(metrics),
        error: None,
        fallback: false,
    }
}
