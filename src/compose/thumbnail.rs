//! The thumbnail compositor.
//!
//! ```text
//! validate request ─▶ resolve arrangement ─▶ reconcile ─▶ geometry
//!        (auto: decode + analyze every image ∥, then select)
//! ─▶ prepare sources ∥ (decode, optional enhancement)
//! ─▶ finish slots ∥ (cover-fit + cosmetic chain)
//! ─▶ draw list (tiles, dividers, text) ─▶ composite ─▶ PNG
//! ```
//!
//! Stages marked ∥ run on the rayon pool and collect in input order; the draw
//! list is assembled by the calling thread once every tile is ready, so the
//! paint order never depends on scheduling.
//!
//! Anything that can be rejected without touching pixels (no images, bad
//! colours, unknown arrangement) is rejected before decoding starts.

use super::overlay::{HexColor, InvalidColor, TextLayer, TextOverlay, Tilt, divider_svg, text_overlay_svg};
use super::reconcile::reconcile;
use crate::analysis::ImageFeature;
use crate::enhance::EnhanceLevel;
use crate::imaging::{
    BackendError, CompositeOp, PngOptions, RasterBackend, analyze_image, enhance_image, finish_slot,
    plan_enhancement,
};
use crate::layout::{
    ArrangementSpec, Catalog, GeometryRequest, LayoutDecision, LayoutError, LayoutMode, SlotRect,
    compute_layout, select_layout,
};
use crate::naming::{self, NamingError};
use chrono::Utc;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CANVAS_WIDTH: u32 = 1280;
pub const CANVAS_HEIGHT: u32 = 720;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("No images supplied")]
    InsufficientImages,
    #[error(transparent)]
    InvalidLayout(#[from] LayoutError),
    #[error("Failed to process image {index}: {source}")]
    ImageProcessing {
        /// 1-based position in the request's image list.
        index: usize,
        #[source]
        source: BackendError,
    },
    #[error(transparent)]
    InvalidColor(#[from] InvalidColor),
    #[error("Arrangement '{0}' produced no slots")]
    EmptyLayout(String),
    #[error(transparent)]
    Output(#[from] NamingError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Everything needed to build one thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailRequest {
    pub images: Vec<PathBuf>,
    /// Divider thickness in pixels; slots are inset by half of it.
    pub delimiter_width: u32,
    pub delimiter_tilt: Tilt,
    pub delimiter_color: String,
    pub output_name: Option<String>,
    pub enhance_level: EnhanceLevel,
    pub apply_enhance: bool,
    /// `auto`, a grid id like `2x3`, a custom shape name, or `2-split`/`3-split`.
    pub layout_mode: String,
    /// Re-encode at maximum compression and keep the smaller file.
    pub youtube_optimize: bool,
    pub compression_level: u8,
    pub text_overlay: Option<TextOverlay>,
}

impl Default for ThumbnailRequest {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            delimiter_width: 0,
            delimiter_tilt: Tilt::default(),
            delimiter_color: "#ffffff".to_string(),
            output_name: None,
            enhance_level: EnhanceLevel::default(),
            apply_enhance: false,
            layout_mode: "auto".to_string(),
            youtube_optimize: true,
            compression_level: 8,
            text_overlay: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub original_size: usize,
    pub optimized_size: usize,
    pub savings_percent: f64,
}

impl OptimizationResult {
    pub fn new(original_size: usize, optimized_size: usize) -> Self {
        let savings_percent = if original_size == 0 {
            0.0
        } else {
            (original_size as f64 - optimized_size as f64) / original_size as f64 * 100.0
        };
        Self {
            original_size,
            optimized_size,
            savings_percent,
        }
    }
}

/// An encoded thumbnail that has not been written anywhere yet.
#[derive(Debug, Clone)]
pub struct RenderedThumbnail {
    pub png: Vec<u8>,
    pub arrangement_id: String,
    /// Selector confidence; `None` when the arrangement was named explicitly.
    pub confidence: Option<f64>,
    /// Slots filled on the canvas, counting repeated images.
    pub images_used: usize,
    pub decision: Option<LayoutDecision>,
    pub optimization: Option<OptimizationResult>,
}

/// Outcome of [`create_thumbnail`], successful or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThumbnailResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    pub images_used: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Decode and analyze every image in parallel, then select an arrangement.
///
/// Images that fail to decode or analyze are logged and left out of the
/// aggregate; their slot in the returned buffer list is `None`. Successfully
/// decoded images are handed back so the compositor does not decode twice.
pub fn determine_layout(
    backend: &impl RasterBackend,
    catalog: &Catalog,
    paths: &[PathBuf],
) -> (LayoutDecision, Vec<Option<RgbaImage>>) {
    let analyzed: Vec<Option<(ImageFeature, RgbaImage)>> = paths
        .par_iter()
        .map(|path| {
            let result = backend.decode(path).and_then(|image| {
                let feature = analyze_image(backend, path, &image)?;
                Ok((feature, image))
            });
            match result {
                Ok(pair) => Some(pair),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Excluding image from layout analysis");
                    None
                }
            }
        })
        .collect();

    let features: Vec<ImageFeature> = analyzed.iter().flatten().map(|(f, _)| f.clone()).collect();
    let decision = select_layout(&features, catalog);
    info!(
        arrangement = %decision.arrangement_id,
        confidence = decision.confidence,
        analyzed = features.len(),
        supplied = paths.len(),
        "Layout selected"
    );
    let decoded = analyzed.into_iter().map(|a| a.map(|(_, image)| image)).collect();
    (decision, decoded)
}

/// Canvas fill colour: the delimiter colour shows through the gaps of a
/// custom arrangement with visible dividers, everything else is white.
pub fn background_color(spec: &ArrangementSpec, delimiter_width: u32, delimiter: HexColor) -> HexColor {
    if !spec.is_grid() && delimiter_width > 0 {
        delimiter
    } else {
        HexColor::WHITE
    }
}

/// Order the layers: one tile per slot, then the divider layer, with the
/// text layer inserted according to its [`TextLayer`].
pub fn build_draw_list(
    tiles: Vec<RgbaImage>,
    slots: &[SlotRect],
    dividers: Option<RgbaImage>,
    text: Option<(RgbaImage, TextLayer)>,
) -> Vec<CompositeOp> {
    let mut ops: Vec<CompositeOp> = tiles
        .into_iter()
        .zip(slots)
        .map(|(tile, slot)| CompositeOp::over(tile, slot.left as i64, slot.top as i64))
        .collect();
    if let Some(layer) = dividers {
        ops.push(CompositeOp::over(layer, 0, 0));
    }
    if let Some((layer, position)) = text {
        let at = position.insert_index(ops.len());
        ops.insert(at, CompositeOp::over(layer, 0, 0));
    }
    ops
}

/// Decode (if needed) and optionally enhance one source image.
///
/// A failing enhancement chain leaves the image as decoded.
fn prepare_source(
    backend: &impl RasterBackend,
    path: &Path,
    cached: Option<RgbaImage>,
    enhance: Option<EnhanceLevel>,
) -> Result<RgbaImage, BackendError> {
    let image = match cached {
        Some(image) => image,
        None => backend.decode(path)?,
    };
    let Some(level) = enhance else {
        return Ok(image);
    };
    match plan_enhancement(backend, &image, level).and_then(|p| enhance_image(backend, &image, &p)) {
        Ok(enhanced) => Ok(enhanced),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Enhancement failed, using original image");
            Ok(image)
        }
    }
}

/// Build and encode a thumbnail without writing it.
pub fn render_thumbnail(
    backend: &impl RasterBackend,
    catalog: &Catalog,
    request: &ThumbnailRequest,
) -> Result<RenderedThumbnail, ThumbnailError> {
    if request.images.is_empty() {
        return Err(ThumbnailError::InsufficientImages);
    }
    let delimiter_color: HexColor = request.delimiter_color.parse()?;
    let text = request.text_overlay.as_ref().filter(|t| !t.is_empty());
    let text_markup = text
        .map(|t| text_overlay_svg(t, CANVAS_WIDTH, CANVAS_HEIGHT))
        .transpose()?;
    let named = LayoutMode::parse(&request.layout_mode).resolve(catalog)?;

    let started = Instant::now();
    let (spec, decision, decoded) = match named {
        Some(spec) => {
            info!(arrangement = %spec.id, "Using requested arrangement");
            let decoded: Vec<Option<RgbaImage>> = request.images.iter().map(|_| None).collect();
            (spec, None, decoded)
        }
        None => {
            let (decision, decoded) = determine_layout(backend, catalog, &request.images);
            let spec = catalog.require(&decision.arrangement_id)?;
            (spec, Some(decision), decoded)
        }
    };

    let reconciled = reconcile(spec, catalog, request.images.len())?;
    let spec = reconciled.spec;
    let sources_needed = reconciled.indices.iter().max().map_or(0, |m| m + 1);
    let images_used = reconciled.indices.len();

    let layout = compute_layout(
        spec,
        &GeometryRequest::new(
            CANVAS_WIDTH,
            CANVAS_HEIGHT,
            request.delimiter_width / 2,
            reconciled.indices.len(),
        ),
    );
    if layout.is_empty() {
        return Err(ThumbnailError::EmptyLayout(spec.id.clone()));
    }

    let enhance = request.apply_enhance.then_some(request.enhance_level);
    let sources: Vec<RgbaImage> = decoded
        .into_par_iter()
        .take(sources_needed)
        .enumerate()
        .map(|(i, cached)| {
            prepare_source(backend, &request.images[i], cached, enhance)
                .map_err(|source| ThumbnailError::ImageProcessing { index: i + 1, source })
        })
        .collect::<Result<_, _>>()?;
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, images = sources_needed, "Sources prepared");

    let tiles: Vec<RgbaImage> = layout
        .slots
        .par_iter()
        .zip(reconciled.indices.par_iter())
        .map(|(slot, &i)| {
            finish_slot(backend, &sources[i], slot)
                .map_err(|source| ThumbnailError::ImageProcessing { index: i + 1, source })
        })
        .collect::<Result<_, _>>()?;
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, slots = tiles.len(), "Slots finished");

    let dividers = if request.delimiter_width > 0 && !layout.dividers.is_empty() {
        let markup = divider_svg(
            &layout.dividers,
            request.delimiter_width,
            request.delimiter_tilt.degrees(),
            delimiter_color,
            (CANVAS_WIDTH, CANVAS_HEIGHT),
        );
        Some(backend.render_svg(&markup, CANVAS_WIDTH, CANVAS_HEIGHT)?)
    } else {
        None
    };
    let text_layer = match (text, text_markup) {
        (Some(overlay), Some(markup)) => Some((
            backend.render_svg(&markup, CANVAS_WIDTH, CANVAS_HEIGHT)?,
            overlay.layer,
        )),
        _ => None,
    };

    let ops = build_draw_list(tiles, &layout.slots, dividers, text_layer);
    let background = background_color(spec, request.delimiter_width, delimiter_color);
    let canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba(background.rgba()));
    let canvas = backend.composite(canvas, &ops)?;

    let png = backend.encode_png(&canvas, &PngOptions::new(request.compression_level))?;
    let (png, optimization) = if request.youtube_optimize {
        let smaller = backend.encode_png(&canvas, &PngOptions::max_compression())?;
        let result = OptimizationResult::new(png.len(), smaller.len().min(png.len()));
        debug!(
            original = result.original_size,
            optimized = result.optimized_size,
            "PNG optimized"
        );
        (if smaller.len() < png.len() { smaller } else { png }, Some(result))
    } else {
        (png, None)
    };
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, bytes = png.len(), "Encoded");

    Ok(RenderedThumbnail {
        png,
        arrangement_id: spec.id.clone(),
        confidence: decision.as_ref().map(|d| d.confidence),
        images_used,
        decision,
        optimization,
    })
}

/// Render a thumbnail and write it into `output_dir`.
///
/// Never fails: errors come back as a result with `success: false` and the
/// error message, alongside the elapsed time.
pub fn create_thumbnail(
    backend: &impl RasterBackend,
    catalog: &Catalog,
    request: &ThumbnailRequest,
    output_dir: &Path,
) -> ThumbnailResult {
    let started = Instant::now();
    let outcome = render_thumbnail(backend, catalog, request).and_then(|rendered| {
        let path = naming::output_path(
            output_dir,
            request.output_name.as_deref(),
            &rendered.arrangement_id,
            Utc::now(),
        )?;
        std::fs::create_dir_all(output_dir)?;
        std::fs::write(&path, &rendered.png)?;
        Ok((rendered, path))
    });
    let processing_time_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok((rendered, path)) => {
            info!(
                path = %path.display(),
                layout = %rendered.arrangement_id,
                elapsed_ms = processing_time_ms,
                "Thumbnail written"
            );
            ThumbnailResult {
                success: true,
                output_path: Some(path),
                output_dir: Some(output_dir.to_path_buf()),
                layout: Some(rendered.arrangement_id),
                images_used: rendered.images_used,
                confidence: rendered.confidence,
                processing_time_ms,
                optimization: rendered.optimization,
                error: None,
            }
        }
        Err(e) => {
            warn!(error = %e, elapsed_ms = processing_time_ms, "Thumbnail failed");
            ThumbnailResult {
                success: false,
                processing_time_ms,
                error: Some(e.to_string()),
                ..ThumbnailResult::default()
            }
        }
    }
}
