//! High-level image operations.
//!
//! These functions combine the pure calculators with backend execution: they
//! decide which primitives an image goes through, in which order, with which
//! parameters, and leave the pixel work to the [`RasterBackend`].

use super::backend::{BackendError, RasterBackend};
use super::params::{BlendMode, CompositeOp, Kernel, LinearParams, ModulateParams};
use crate::analysis::{ImageFeature, analyze_color};
use crate::compose::overlay::vignette_svg;
use crate::enhance::{EnhanceLevel, EnhancementParams, Sharpen};
use crate::layout::SlotRect;
use image::RgbaImage;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Longest side of the edge map used for subject detection.
pub const EDGE_MAP_SIDE: u32 = 200;

/// Sharpening applied to every slot after cover-fit.
pub const SLOT_SHARPEN: Sharpen = Sharpen {
    sigma: 1.2,
    m1: 1.0,
    m2: 2.0,
    x1: 2.0,
    y2: 10.0,
};

/// Extract layout features from an already decoded image.
pub fn analyze_image(
    backend: &impl RasterBackend,
    path: &Path,
    image: &RgbaImage,
) -> Result<ImageFeature> {
    let stats = backend.stats(image)?;
    let grayscale = backend.grayscale(image)?;
    let edges = backend.edge_map(image, EDGE_MAP_SIDE)?;
    Ok(ImageFeature::from_parts(
        path.display().to_string(),
        image.dimensions(),
        &stats,
        &grayscale,
        &edges,
    ))
}

/// Measure an image and compute its boosted, capped enhancement parameters.
pub fn plan_enhancement(
    backend: &impl RasterBackend,
    image: &RgbaImage,
    level: EnhanceLevel,
) -> Result<EnhancementParams> {
    let stats = backend.stats(image)?;
    let analysis =
        analyze_color(&stats).map_err(|e| BackendError::ProcessingFailed(e.to_string()))?;
    Ok(EnhancementParams::calculate(&analysis, level).with_thumbnail_boost())
}

/// Run the enhancement chain:
/// normalise → modulate → gamma → linear → sharpen → centre-weighted convolve.
pub fn enhance_image(
    backend: &impl RasterBackend,
    image: &RgbaImage,
    params: &EnhancementParams,
) -> Result<RgbaImage> {
    let img = backend.normalise(image.clone(), params.normalise)?;
    let img = backend.modulate(
        img,
        &ModulateParams {
            brightness: params.brightness,
            saturation: params.saturation,
            hue: params.white_balance,
        },
    )?;
    let img = backend.gamma(img, params.gamma)?;
    let img = backend.linear(img, &params.contrast.into())?;
    let img = backend.sharpen(img, &params.sharpen)?;
    backend.convolve(img, &Kernel::center_weighted())
}

/// Cover-fit an image into its slot and apply the fixed cosmetic chain:
/// vignette, sharpen, linear contrast boost, brightness/saturation boost.
pub fn finish_slot(
    backend: &impl RasterBackend,
    image: &RgbaImage,
    slot: &SlotRect,
) -> Result<RgbaImage> {
    let (w, h) = (slot.width, slot.height);
    let fitted = backend.resize_cover(image, w, h)?;
    let vignette = backend.render_svg(&vignette_svg(w, h), w, h)?;
    let img = backend.composite(
        fitted,
        &[CompositeOp {
            image: vignette,
            left: 0,
            top: 0,
            blend: BlendMode::Overlay,
        }],
    )?;
    let img = backend.sharpen(img, &SLOT_SHARPEN)?;
    let img = backend.linear(
        img,
        &LinearParams {
            multiply: 1.1,
            offset: 0.0,
        },
    )?;
    backend.modulate(img, &ModulateParams::new(1.05, 1.1))
}
