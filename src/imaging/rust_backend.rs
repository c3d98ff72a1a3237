//! Pure Rust raster backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image` decoders + `apply_orientation` for EXIF rotation |
//! | Statistics, normalise, gamma, linear | per-pixel loops over `RgbaImage` |
//! | Modulate | `image::imageops::colorops::huerotate_in_place` for hue, then a saturation/brightness loop |
//! | Sharpen | `image::imageops::blur` as the unsharp mask |
//! | Convolve | edge-clamped 3×3 loop |
//! | Edge map | `image::imageops::filter3x3` with a Laplacian kernel |
//! | Cover-fit | `crop_imm` to the slot aspect, then `image::imageops::resize` (`Lanczos3`) |
//! | Vector graphics, text | `usvg` parse + `resvg` render onto a `tiny_skia::Pixmap` |
//! | Composite | straight-alpha blending, `over` or `overlay` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |

use super::backend::{BackendError, RasterBackend};
use super::calculations::{calculate_cover_crop, center_crop_offset, clip_layer, fit_inside};
use super::params::{BlendMode, CompositeOp, Kernel, LinearParams, ModulateParams, PngOptions};
use crate::analysis::{ChannelStats, EdgeMap, ImageStats};
use crate::enhance::{NormaliseRange, Sharpen};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::path::Path;
use std::sync::{Arc, LazyLock};

const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` and `resvg` crates.
///
/// Holds the font database used for text overlays; it is loaded once on
/// construction and shared by every `render_svg` call.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl RustBackend {
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self { fontdb: Arc::new(db) }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Apply a 256-entry lookup table to the colour channels, leaving alpha.
fn map_rgb(mut image: RgbaImage, lut: &[u8; 256]) -> RgbaImage {
    for px in image.pixels_mut() {
        for c in 0..3 {
            px.0[c] = lut[px.0[c] as usize];
        }
    }
    image
}

fn build_lut(f: impl Fn(f64) -> f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = clamp_u8(f(i as f64));
    }
    lut
}

/// 3×3 convolution of the colour channels, normalised by the kernel sum.
/// Borders sample the nearest edge pixel; alpha is copied through.
fn convolve_clamped(image: &RgbaImage, kernel: &[f32; 9]) -> RgbaImage {
    let sum: f32 = kernel.iter().sum();
    let norm = if sum == 0.0 { 1.0 } else { sum };
    let (w, h) = image.dimensions();
    RgbaImage::from_fn(w, h, |x, y| {
        let mut acc = [0f32; 3];
        for (i, weight) in kernel.iter().enumerate() {
            let sx = (x as i64 + (i % 3) as i64 - 1).clamp(0, w as i64 - 1) as u32;
            let sy = (y as i64 + (i / 3) as i64 - 1).clamp(0, h as i64 - 1) as u32;
            let p = image.get_pixel(sx, sy).0;
            for c in 0..3 {
                acc[c] += p[c] as f32 * weight;
            }
        }
        let alpha = image.get_pixel(x, y).0[3];
        Rgba([
            clamp_u8((acc[0] / norm) as f64),
            clamp_u8((acc[1] / norm) as f64),
            clamp_u8((acc[2] / norm) as f64),
            alpha,
        ])
    })
}

fn blend_channel(mode: BlendMode, backdrop: f64, source: f64) -> f64 {
    match mode {
        BlendMode::Over => source,
        BlendMode::Overlay => {
            if backdrop < 0.5 {
                2.0 * backdrop * source
            } else {
                1.0 - 2.0 * (1.0 - backdrop) * (1.0 - source)
            }
        }
    }
}

fn paint_layer(base: &mut RgbaImage, layer: &CompositeOp) {
    let Some((sx, sy, dx, dy, w, h)) =
        clip_layer(base.dimensions(), layer.image.dimensions(), layer.left, layer.top)
    else {
        return;
    };

    for y in 0..h {
        for x in 0..w {
            let src = layer.image.get_pixel(sx + x, sy + y).0;
            let alpha = src[3] as f64 / 255.0;
            if alpha == 0.0 {
                continue;
            }
            let dst = base.get_pixel_mut(dx + x, dy + y);
            let backdrop_alpha = dst.0[3] as f64 / 255.0;
            for c in 0..3 {
                let cb = dst.0[c] as f64 / 255.0;
                let cs = src[c] as f64 / 255.0;
                let mixed = blend_channel(layer.blend, cb, cs);
                dst.0[c] = clamp_u8(((1.0 - alpha) * cb + alpha * mixed) * 255.0);
            }
            dst.0[3] = clamp_u8((alpha + backdrop_alpha * (1.0 - alpha)) * 255.0);
        }
    }
}

impl RasterBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        let decode_err = |e: image::ImageError| BackendError::Decode {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        let mut decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()
            .map_err(decode_err)?;
        let orientation = decoder.orientation().map_err(decode_err)?;
        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        image.apply_orientation(orientation);
        Ok(image.into_rgba8())
    }

    fn stats(&self, image: &RgbaImage) -> Result<ImageStats, BackendError> {
        let count = image.width() as f64 * image.height() as f64;
        if count == 0.0 {
            return Err(BackendError::ProcessingFailed("Cannot compute statistics of an empty image".into()));
        }

        let mut sum = [0f64; 4];
        let mut sum_sq = [0f64; 4];
        let mut min = [u8::MAX; 4];
        let mut max = [u8::MIN; 4];
        for px in image.pixels() {
            for c in 0..4 {
                let v = px.0[c];
                sum[c] += v as f64;
                sum_sq[c] += (v as f64) * (v as f64);
                min[c] = min[c].min(v);
                max[c] = max[c].max(v);
            }
        }

        let channels = (0..4)
            .map(|c| {
                let mean = sum[c] / count;
                let variance = (sum_sq[c] / count - mean * mean).max(0.0);
                ChannelStats {
                    mean,
                    min: min[c] as f64,
                    max: max[c] as f64,
                    stdev: variance.sqrt(),
                }
            })
            .collect();
        Ok(ImageStats { channels })
    }

    fn grayscale(&self, image: &RgbaImage) -> Result<Vec<u8>, BackendError> {
        Ok(imageops::grayscale(image).into_raw())
    }

    fn edge_map(&self, image: &RgbaImage, max_side: u32) -> Result<EdgeMap, BackendError> {
        let (w, h) = fit_inside(image.dimensions(), max_side);
        let small = imageops::resize(image, w, h, FilterType::Triangle);
        let gray = imageops::grayscale(&small);
        let edges: image::GrayImage = imageops::filter3x3(&gray, &Kernel::laplacian().0);
        Ok(EdgeMap {
            buffer: edges.into_raw(),
            width: w,
            height: h,
        })
    }

    fn normalise(&self, image: RgbaImage, range: NormaliseRange) -> Result<RgbaImage, BackendError> {
        let mut histogram = [0usize; 256];
        for px in image.pixels() {
            histogram[clamp_u8(luma(px.0[0], px.0[1], px.0[2])) as usize] += 1;
        }
        let total = image.pixels().len();
        if total == 0 {
            return Ok(image);
        }

        let percentile = |fraction: f64| {
            let wanted = (fraction.clamp(0.0, 1.0) * total as f64).ceil() as usize;
            let mut seen = 0;
            for (value, &n) in histogram.iter().enumerate() {
                seen += n;
                if seen >= wanted.max(1) {
                    return value as f64;
                }
            }
            255.0
        };
        let lo = percentile(range.lower);
        let hi = percentile(range.upper);
        if hi <= lo {
            return Ok(image);
        }

        let lut = build_lut(|v| (v - lo) * 255.0 / (hi - lo));
        Ok(map_rgb(image, &lut))
    }

    fn modulate(&self, mut image: RgbaImage, params: &ModulateParams) -> Result<RgbaImage, BackendError> {
        let degrees = params.hue.round();
        if degrees != 0.0 && degrees.is_finite() {
            imageops::colorops::huerotate_in_place(&mut image, degrees as i32);
        }
        for px in image.pixels_mut() {
            let rgb = [px.0[0] as f64, px.0[1] as f64, px.0[2] as f64];
            let l = 0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2];
            for (c, v) in rgb.iter().enumerate() {
                px.0[c] = clamp_u8((l + (v - l) * params.saturation) * params.brightness);
            }
        }
        Ok(image)
    }

    fn gamma(&self, image: RgbaImage, gamma: f64) -> Result<RgbaImage, BackendError> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(BackendError::ProcessingFailed(format!("Invalid gamma {gamma}")));
        }
        let lut = build_lut(|v| (v / 255.0).powf(gamma) * 255.0);
        Ok(map_rgb(image, &lut))
    }

    fn linear(&self, image: RgbaImage, params: &LinearParams) -> Result<RgbaImage, BackendError> {
        let lut = build_lut(|v| params.multiply * v + params.offset * 255.0);
        Ok(map_rgb(image, &lut))
    }

    fn sharpen(&self, mut image: RgbaImage, params: &Sharpen) -> Result<RgbaImage, BackendError> {
        if !params.sigma.is_finite() || params.sigma <= 0.0 {
            return Err(BackendError::ProcessingFailed(format!("Invalid sharpen sigma {}", params.sigma)));
        }
        let blurred = imageops::blur(&image, params.sigma as f32);
        for (px, soft) in image.pixels_mut().zip(blurred.pixels()) {
            for c in 0..3 {
                let diff = px.0[c] as f64 - soft.0[c] as f64;
                let gain = if diff.abs() < params.x1 { params.m1 } else { params.m2 };
                let delta = (diff * gain).clamp(-2.0 * params.y2, params.y2);
                px.0[c] = clamp_u8(px.0[c] as f64 + delta);
            }
        }
        Ok(image)
    }

    fn convolve(&self, image: RgbaImage, kernel: &Kernel) -> Result<RgbaImage, BackendError> {
        Ok(convolve_clamped(&image, &kernel.0))
    }

    fn resize_cover(&self, image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, BackendError> {
        if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Cannot cover-fit {}x{} into {width}x{height}",
                image.width(),
                image.height()
            )));
        }
        let (crop_w, crop_h) = calculate_cover_crop(image.dimensions(), (width, height));
        let (x, y) = center_crop_offset(image.dimensions(), (crop_w, crop_h));
        let window = imageops::crop_imm(image, x, y, crop_w, crop_h).to_image();
        Ok(imageops::resize(&window, width, height, FilterType::Lanczos3))
    }

    fn render_svg(&self, markup: &str, width: u32, height: u32) -> Result<RgbaImage, BackendError> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(markup, &opts)
            .map_err(|e| BackendError::ProcessingFailed(format!("Invalid SVG markup: {e}")))?;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| BackendError::ProcessingFailed(format!("Cannot allocate {width}x{height} pixmap")))?;

        let sx = width as f32 / tree.size().width();
        let sy = height as f32 / tree.size().height();
        resvg::render(&tree, resvg::tiny_skia::Transform::from_scale(sx, sy), &mut pixmap.as_mut());

        let mut out = RgbaImage::new(width, height);
        for (dst, px) in out.pixels_mut().zip(pixmap.pixels()) {
            let c = px.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(out)
    }

    fn composite(&self, mut base: RgbaImage, layers: &[CompositeOp]) -> Result<RgbaImage, BackendError> {
        for layer in layers {
            paint_layer(&mut base, layer);
        }
        Ok(base)
    }

    fn encode_png(&self, image: &RgbaImage, options: &PngOptions) -> Result<Vec<u8>, BackendError> {
        let compression = match options.compression_level {
            0..=3 => CompressionType::Fast,
            4..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        };
        let filter = if options.adaptive_filter {
            PngFilter::Adaptive
        } else {
            PngFilter::NoFilter
        };

        let mut bytes = Vec::new();
        PngEncoder::new_with_quality(&mut bytes, compression, filter)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encoding failed: {e}")))?;
        Ok(bytes)
    }
}
