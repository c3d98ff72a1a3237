//! Parameter types for raster operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides which adjustments an image gets) and the
//! [`backend`](super::backend) (which does the pixel work). Keeping them apart
//! lets the pipeline run against a recording mock.
//!
//! ## Types
//!
//! - [`ModulateParams`]: Brightness and saturation multipliers plus a hue rotation in degrees.
//! - [`LinearParams`]: `v * multiply + offset * 255` per colour channel.
//! - [`Kernel`]: 3×3 convolution weights, normalised by their sum when applied.
//! - [`BlendMode`] / [`CompositeOp`]: One layer of the final draw list.
//! - [`PngOptions`]: zlib level (0–9) and adaptive row filtering.

use crate::enhance::Contrast;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Brightness/saturation/hue adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulateParams {
    pub brightness: f64,
    pub saturation: f64,
    /// Hue rotation in degrees.
    pub hue: f64,
}

impl ModulateParams {
    pub fn new(brightness: f64, saturation: f64) -> Self {
        Self {
            brightness,
            saturation,
            hue: 0.0,
        }
    }
}

/// Linear contrast stretch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearParams {
    pub multiply: f64,
    /// Offset as a fraction of full scale.
    pub offset: f64,
}

impl From<Contrast> for LinearParams {
    fn from(c: Contrast) -> Self {
        Self {
            multiply: c.multiply,
            offset: c.offset,
        }
    }
}

/// 3×3 convolution kernel in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel(pub [f32; 9]);

impl Kernel {
    /// Near-box blur with a slightly heavier centre, used at the end of the
    /// enhancement chain to soften sharpening halos.
    pub fn center_weighted() -> Self {
        Self([1.0, 1.0, 1.0, 1.0, 1.1, 1.0, 1.0, 1.0, 1.0])
    }

    /// Laplacian edge detector.
    pub fn laplacian() -> Self {
        Self([-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0])
    }
}

/// How a layer mixes with what is already painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Source replaces backdrop, weighted by source alpha.
    #[default]
    Over,
    /// Darkens dark backdrops and lightens light ones; used for the slot vignette.
    Overlay,
}

/// One layer of a composite, painted at `(left, top)` on the base.
///
/// Offsets are signed: layers may hang off any edge and are clipped.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOp {
    pub image: RgbaImage,
    pub left: i64,
    pub top: i64,
    pub blend: BlendMode,
}

impl CompositeOp {
    pub fn over(image: RgbaImage, left: i64, top: i64) -> Self {
        Self {
            image,
            left,
            top,
            blend: BlendMode::Over,
        }
    }
}

/// PNG encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngOptions {
    /// zlib-style level, 0 (fastest) to 9 (smallest). Clamped on construction.
    pub compression_level: u8,
    pub adaptive_filter: bool,
}

impl PngOptions {
    pub fn new(compression_level: u8) -> Self {
        Self {
            compression_level: compression_level.min(9),
            adaptive_filter: true,
        }
    }

    pub fn max_compression() -> Self {
        Self::new(9)
    }
}

impl Default for PngOptions {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_compression_clamps_to_nine() {
        assert_eq!(PngOptions::new(12).compression_level, 9);
        assert_eq!(PngOptions::new(3).compression_level, 3);
    }

    #[test]
    fn png_default_is_level_eight_adaptive() {
        let opts = PngOptions::default();
        assert_eq!(opts.compression_level, 8);
        assert!(opts.adaptive_filter);
    }

    #[test]
    fn linear_from_contrast() {
        let p = LinearParams::from(Contrast {
            multiply: 1.2,
            offset: -0.02,
        });
        assert_eq!(p.multiply, 1.2);
        assert_eq!(p.offset, -0.02);
    }

    #[test]
    fn kernels_sum() {
        assert_eq!(Kernel::laplacian().0.iter().sum::<f32>(), 0.0);
        assert!((Kernel::center_weighted().0.iter().sum::<f32>() - 9.1).abs() < 1e-5);
    }
}
