//! Adaptive enhancement parameters.
//!
//! Maps a [`ColorAnalysis`] and a user-facing [`EnhanceLevel`] to the
//! concrete adjustments the backend applies. The mapping is a fixed branch
//! table: underexposed / overexposed / normal exposure, low contrast, low
//! saturation, plus a three-way sharpening branch. A constant thumbnail boost
//! of 1.2 is folded into the saturation, contrast, brightness and sharpening
//! paths so small collage tiles still read well.
//!
//! The calculator is pure. Final clamps (saturation at 1.8, contrast at 1.3)
//! belong to the caller and live in [`EnhancementParams::with_thumbnail_boost`].

use crate::analysis::ColorAnalysis;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Always-on boost for thumbnail output.
pub const THUMBNAIL_BOOST: f64 = 1.2;

/// User-selectable enhancement strength.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhanceLevel {
    None,
    Light,
    #[default]
    Medium,
    High,
}

impl EnhanceLevel {
    pub fn multiplier(self) -> f64 {
        match self {
            EnhanceLevel::None => 0.0,
            EnhanceLevel::Light => 0.7,
            EnhanceLevel::Medium => 1.0,
            EnhanceLevel::High => 1.3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnhanceLevel::None => "none",
            EnhanceLevel::Light => "light",
            EnhanceLevel::Medium => "medium",
            EnhanceLevel::High => "high",
        }
    }
}

impl fmt::Display for EnhanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnhanceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(EnhanceLevel::None),
            "light" => Ok(EnhanceLevel::Light),
            "medium" => Ok(EnhanceLevel::Medium),
            "high" => Ok(EnhanceLevel::High),
            other => Err(format!(
                "unknown enhance level '{other}' (expected none, light, medium or high)"
            )),
        }
    }
}

/// Percentile bounds (fractions) for the normalise stretch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormaliseRange {
    pub lower: f64,
    pub upper: f64,
}

/// `output = multiply * input + offset` on normalised values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contrast {
    pub multiply: f64,
    pub offset: f64,
}

/// Unsharp-mask parameters.
///
/// - `sigma`: blur radius of the mask
/// - `m1`: gain in flat areas (difference below `x1`)
/// - `m2`: gain in jagged areas (difference above `x1`)
/// - `x1`: flat/jagged threshold on the 0–255 scale
/// - `y2`: maximum brightening per pixel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sharpen {
    pub sigma: f64,
    pub m1: f64,
    pub m2: f64,
    pub x1: f64,
    pub y2: f64,
}

impl Sharpen {
    pub const BASE: Sharpen = Sharpen {
        sigma: 0.8,
        m1: 1.0,
        m2: 2.0,
        x1: 2.0,
        y2: 10.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnhancementParams {
    pub normalise: NormaliseRange,
    pub brightness: f64,
    pub saturation: f64,
    /// Hue rotation in degrees; 0 means no white-balance correction.
    pub white_balance: f64,
    pub gamma: f64,
    pub contrast: Contrast,
    pub sharpen: Sharpen,
}

impl EnhancementParams {
    /// Compute adjustments for one image.
    pub fn calculate(analysis: &ColorAnalysis, level: EnhanceLevel) -> Self {
        let i = level.multiplier();
        let b = THUMBNAIL_BOOST;

        let underexposed = analysis.mean_brightness < 0.4;
        let overexposed = analysis.mean_brightness > 0.7;
        let low_contrast = analysis.contrast < 0.3;
        let low_saturation = analysis.saturation_level < 0.25;
        // Checked after `low_saturation`, which already covers it.
        let desaturated = analysis.saturation_level < 0.15;

        let brightness = if underexposed {
            1.0 + 0.2 * i * b
        } else if overexposed {
            1.0 - 0.1 * i
        } else {
            1.0 + 0.05 * i
        };

        let saturation = if low_saturation {
            1.0 + 0.5 * i * b
        } else if desaturated {
            1.0 + 0.7 * i * b
        } else {
            1.0 + 0.2 * i * b
        };

        let white_balance = if analysis.color_cast {
            white_balance_shift(&analysis.channel_means)
        } else {
            0.0
        };

        let gamma = if underexposed {
            0.9 - 0.1 * i
        } else {
            1.1 + 0.1 * i
        };

        let contrast = Contrast {
            multiply: if low_contrast {
                1.0 + 0.25 * i * b
            } else {
                1.0 + 0.15 * i * b
            },
            offset: if underexposed {
                0.02 * i
            } else if overexposed {
                -0.02 * i
            } else {
                0.0
            },
        };

        Self {
            normalise: NormaliseRange {
                lower: if underexposed { 0.01 } else { 0.03 },
                upper: if overexposed { 0.98 } else { 0.97 },
            },
            brightness,
            saturation,
            white_balance,
            gamma,
            contrast,
            sharpen: adaptive_sharpening(analysis, i * b),
        }
    }

    /// Apply the final thumbnail boost and caps.
    ///
    /// Saturation ×1.2 capped at 1.8, contrast ×1.15 capped at 1.3, sharpening
    /// flat gain ×1.2 and jagged gain ×1.1.
    pub fn with_thumbnail_boost(self) -> Self {
        Self {
            saturation: (self.saturation * 1.2).min(1.8),
            contrast: Contrast {
                multiply: (self.contrast.multiply * 1.15).min(1.3),
                ..self.contrast
            },
            sharpen: Sharpen {
                m1: self.sharpen.m1 * 1.2,
                m2: self.sharpen.m2 * 1.1,
                ..self.sharpen
            },
            ..self
        }
    }
}

/// Hue shift in degrees that counters a colour cast.
///
/// Takes normalised R, G, B means. Malformed input (fewer than three values,
/// non-finite result) yields 0, i.e. no correction.
pub fn white_balance_shift(channel_means: &[f64]) -> f64 {
    let [r, g, b] = match channel_means.get(..3) {
        Some(&[r, g, b]) => [r, g, b],
        _ => return 0.0,
    };
    let target = (r + g + b) / 3.0;
    let shift = (b - target).atan2(r - target).to_degrees();
    if shift.is_finite() { shift } else { 0.0 }
}

/// Sharpening tuned to contrast and exposure, scaled by `intensity`.
pub fn adaptive_sharpening(analysis: &ColorAnalysis, intensity: f64) -> Sharpen {
    let base = Sharpen::BASE;

    if analysis.contrast < 0.15 {
        // Low contrast: wider, gentler mask
        Sharpen {
            sigma: base.sigma * (1.0 + 0.3 * intensity),
            m1: base.m1 * (1.0 - 0.2 * intensity),
            m2: base.m2 * (1.0 - 0.1 * intensity),
            x1: base.x1 * (1.0 + 0.2 * intensity),
            y2: base.y2 * (1.0 - 0.2 * intensity),
        }
    } else if analysis.mean_brightness < 0.3 {
        // Dark: avoid amplifying noise
        Sharpen {
            sigma: base.sigma * (1.0 - 0.2 * intensity),
            m1: base.m1 * (1.0 - 0.3 * intensity),
            m2: base.m2,
            x1: base.x1 * (1.0 + 0.3 * intensity),
            y2: base.y2 * (1.0 - 0.1 * intensity),
        }
    } else {
        Sharpen {
            sigma: base.sigma * (1.0 + 0.2 * intensity),
            m1: base.m1 * (1.0 + 0.1 * intensity),
            m2: base.m2,
            x1: base.x1,
            y2: base.y2 * (1.0 + 0.1 * intensity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(mean: f64, contrast: f64, saturation: f64) -> ColorAnalysis {
        ColorAnalysis {
            mean_brightness: mean,
            max_brightness: 1.0,
            min_brightness: 0.0,
            contrast,
            color_cast: false,
            saturation_level: saturation,
            is_underexposed: mean < 0.3,
            is_overexposed: mean > 0.7,
            dynamic_range: 1.0,
            channel_means: vec![mean; 3],
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn level_multipliers() {
        assert_eq!(EnhanceLevel::None.multiplier(), 0.0);
        assert_eq!(EnhanceLevel::Light.multiplier(), 0.7);
        assert_eq!(EnhanceLevel::Medium.multiplier(), 1.0);
        assert_eq!(EnhanceLevel::High.multiplier(), 1.3);
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<EnhanceLevel>(), Ok(EnhanceLevel::High));
        assert!("extreme".parse::<EnhanceLevel>().is_err());
        assert_eq!(EnhanceLevel::default(), EnhanceLevel::Medium);
    }

    // =========================================================================
    // Exposure branches
    // =========================================================================

    #[test]
    fn underexposed_medium() {
        let p = EnhancementParams::calculate(&analysis(0.2, 0.4, 0.3), EnhanceLevel::Medium);
        assert!(close(p.brightness, 1.0 + 0.2 * 1.2));
        assert!(close(p.gamma, 0.8));
        assert!(close(p.normalise.lower, 0.01));
        assert!(close(p.normalise.upper, 0.97));
        assert!(close(p.contrast.offset, 0.02));
    }

    #[test]
    fn overexposed_high() {
        let p = EnhancementParams::calculate(&analysis(0.8, 0.4, 0.3), EnhanceLevel::High);
        assert!(close(p.brightness, 1.0 - 0.13));
        assert!(close(p.gamma, 1.1 + 0.13));
        assert!(close(p.normalise.lower, 0.03));
        assert!(close(p.normalise.upper, 0.98));
        assert!(close(p.contrast.offset, -0.026));
    }

    #[test]
    fn normal_exposure_light() {
        let p = EnhancementParams::calculate(&analysis(0.5, 0.4, 0.3), EnhanceLevel::Light);
        assert!(close(p.brightness, 1.035));
        assert!(close(p.gamma, 1.17));
        assert!(close(p.contrast.offset, 0.0));
    }

    #[test]
    fn level_none_is_identity_for_multiplied_terms() {
        let p = EnhancementParams::calculate(&analysis(0.5, 0.1, 0.1), EnhanceLevel::None);
        assert!(close(p.brightness, 1.0));
        assert!(close(p.saturation, 1.0));
        assert!(close(p.contrast.multiply, 1.0));
        assert!(close(p.gamma, 1.1));
        assert_eq!(p.sharpen, Sharpen::BASE);
    }

    // =========================================================================
    // Saturation and contrast
    // =========================================================================

    #[test]
    fn low_saturation_branch_wins_over_desaturated() {
        let p = EnhancementParams::calculate(&analysis(0.5, 0.4, 0.1), EnhanceLevel::Medium);
        assert!(close(p.saturation, 1.0 + 0.5 * 1.2));
    }

    #[test]
    fn normal_saturation() {
        let p = EnhancementParams::calculate(&analysis(0.5, 0.4, 0.5), EnhanceLevel::Medium);
        assert!(close(p.saturation, 1.0 + 0.2 * 1.2));
    }

    #[test]
    fn contrast_multiply_branches() {
        let low = EnhancementParams::calculate(&analysis(0.5, 0.2, 0.5), EnhanceLevel::Medium);
        let normal = EnhancementParams::calculate(&analysis(0.5, 0.4, 0.5), EnhanceLevel::Medium);
        assert!(close(low.contrast.multiply, 1.3));
        assert!(close(normal.contrast.multiply, 1.18));
    }

    // =========================================================================
    // White balance
    // =========================================================================

    #[test]
    fn white_balance_only_with_color_cast() {
        let mut a = analysis(0.5, 0.4, 0.5);
        a.channel_means = vec![0.8, 0.4, 0.3];
        let p = EnhancementParams::calculate(&a, EnhanceLevel::Medium);
        assert_eq!(p.white_balance, 0.0);

        a.color_cast = true;
        let p = EnhancementParams::calculate(&a, EnhanceLevel::Medium);
        let target = 1.5 / 3.0;
        let expected = (0.3f64 - target).atan2(0.8 - target).to_degrees();
        assert!(close(p.white_balance, expected));
    }

    #[test]
    fn white_balance_malformed_means_is_zero() {
        assert_eq!(white_balance_shift(&[0.5, 0.2]), 0.0);
        assert_eq!(white_balance_shift(&[]), 0.0);
        assert_eq!(white_balance_shift(&[f64::NAN, 0.2, 0.1]), 0.0);
    }

    // =========================================================================
    // Sharpening
    // =========================================================================

    #[test]
    fn sharpening_low_contrast_branch() {
        let s = adaptive_sharpening(&analysis(0.5, 0.1, 0.5), 1.2);
        assert!(close(s.sigma, 0.8 * 1.36));
        assert!(close(s.m1, 1.0 * 0.76));
        assert!(close(s.m2, 2.0 * 0.88));
        assert!(close(s.x1, 2.0 * 1.24));
        assert!(close(s.y2, 10.0 * 0.76));
    }

    #[test]
    fn sharpening_dark_branch() {
        let s = adaptive_sharpening(&analysis(0.2, 0.3, 0.5), 1.0);
        assert!(close(s.sigma, 0.64));
        assert!(close(s.m1, 0.7));
        assert!(close(s.m2, 2.0));
        assert!(close(s.x1, 2.6));
        assert!(close(s.y2, 9.0));
    }

    #[test]
    fn sharpening_standard_branch() {
        let s = adaptive_sharpening(&analysis(0.5, 0.3, 0.5), 1.0);
        assert!(close(s.sigma, 0.96));
        assert!(close(s.m1, 1.1));
        assert!(close(s.m2, 2.0));
        assert!(close(s.x1, 2.0));
        assert!(close(s.y2, 11.0));
    }

    // =========================================================================
    // Caller-side boost
    // =========================================================================

    #[test]
    fn thumbnail_boost_caps_saturation_and_contrast() {
        let p = EnhancementParams::calculate(&analysis(0.2, 0.1, 0.1), EnhanceLevel::High)
            .with_thumbnail_boost();
        assert!(close(p.saturation, 1.8));
        assert!(close(p.contrast.multiply, 1.3));
    }

    #[test]
    fn thumbnail_boost_scales_sharpen_gains() {
        let base = EnhancementParams::calculate(&analysis(0.5, 0.3, 0.5), EnhanceLevel::None);
        let boosted = base.with_thumbnail_boost();
        assert!(close(boosted.sharpen.m1, 1.2));
        assert!(close(boosted.sharpen.m2, 2.2));
        assert!(close(boosted.sharpen.sigma, base.sharpen.sigma));
        assert!(close(boosted.saturation, 1.2));
    }
}
