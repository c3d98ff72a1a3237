//! Shared test utilities for the thumbforge test suite.
//!
//! Provides feature-record builders for the layout rules and on-disk image
//! fixtures for anything that goes through a real backend.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let features = vec![feature(1.0), feature_with(0.56, |f| f.has_prominent_subject = true)];
//! let decision = select_layout(&features, &Catalog::standard());
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_solid_png(tmp.path(), "red.png", 64, 48, [255, 0, 0]);
//! ```

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

use crate::analysis::{ImageFeature, classify_orientation};

// =========================================================================
// Feature records
// =========================================================================

/// A plain feature record with the given aspect ratio: low entropy, low
/// visual weight, no prominent subject.
pub fn feature(aspect_ratio: f64) -> ImageFeature {
    let height = 1000;
    ImageFeature {
        path: format!("img-{aspect_ratio}.jpg"),
        width: (aspect_ratio * height as f64).round() as u32,
        height,
        aspect_ratio,
        entropy: 5.0,
        color_variance: 400.0,
        visual_weight: 60.0,
        has_prominent_subject: false,
        orientation: classify_orientation(aspect_ratio),
    }
}

/// [`feature`] with a caller tweak applied.
pub fn feature_with(aspect_ratio: f64, tweak: impl FnOnce(&mut ImageFeature)) -> ImageFeature {
    let mut f = feature(aspect_ratio);
    tweak(&mut f);
    f
}

// =========================================================================
// Image fixtures
// =========================================================================

/// Write a single-colour PNG and return its path.
pub fn write_solid_png(dir: &Path, name: &str, width: u32, height: u32, rgb: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb(rgb))
        .save(&path)
        .unwrap();
    path
}

/// Write a PNG with a bright square in the middle of a dark field, which the
/// analyzer reports as a prominent subject.
pub fn write_subject_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let (x0, x1) = (width / 3, width * 2 / 3);
    let (y0, y1) = (height / 3, height * 2 / 3);
    RgbImage::from_fn(width, height, |x, y| {
        let inside = (x0..x1).contains(&x) && (y0..y1).contains(&y);
        if inside && (x + y) % 2 == 0 {
            Rgb([250, 250, 250])
        } else {
            Rgb([10, 10, 10])
        }
    })
    .save(&path)
    .unwrap();
    path
}
