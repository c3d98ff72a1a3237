//! Raster backend trait and shared types.
//!
//! The [`RasterBackend`] trait lists every pixel primitive the thumbnail
//! pipeline consumes: decode, statistics, the colour and sharpness
//! adjustments, cover-fit resizing, vector rasterization, layer compositing
//! and PNG encoding. Transforms take their input buffer by value and return a
//! new one, so concurrent slots never share writable pixels.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on `image` and
//! `resvg`.

use super::params::{CompositeOp, Kernel, LinearParams, ModulateParams, PngOptions};
use crate::analysis::{EdgeMap, ImageStats};
use crate::enhance::{NormaliseRange, Sharpen};
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for raster backends.
///
/// Every backend implements the full set so the pipeline is backend-agnostic.
/// See the [module docs](self) for the list.
pub trait RasterBackend: Sync {
    /// Decode a file to RGBA, applying any EXIF orientation.
    fn decode(&self, path: &Path) -> Result<RgbaImage, BackendError>;

    /// Per-channel mean/min/max/stdev for R, G, B and A on the 0–255 scale.
    fn stats(&self, image: &RgbaImage) -> Result<ImageStats, BackendError>;

    /// Luma bytes, one per pixel.
    fn grayscale(&self, image: &RgbaImage) -> Result<Vec<u8>, BackendError>;

    /// Laplacian edge intensities of a copy scaled to fit `max_side`.
    fn edge_map(&self, image: &RgbaImage, max_side: u32) -> Result<EdgeMap, BackendError>;

    /// Stretch the luma percentiles `range.lower..range.upper` to full scale.
    fn normalise(&self, image: RgbaImage, range: NormaliseRange) -> Result<RgbaImage, BackendError>;

    fn modulate(&self, image: RgbaImage, params: &ModulateParams) -> Result<RgbaImage, BackendError>;

    /// `v -> v^gamma` on normalised channel values.
    fn gamma(&self, image: RgbaImage, gamma: f64) -> Result<RgbaImage, BackendError>;

    fn linear(&self, image: RgbaImage, params: &LinearParams) -> Result<RgbaImage, BackendError>;

    /// Unsharp mask with separate gains for flat and jagged areas.
    fn sharpen(&self, image: RgbaImage, params: &Sharpen) -> Result<RgbaImage, BackendError>;

    fn convolve(&self, image: RgbaImage, kernel: &Kernel) -> Result<RgbaImage, BackendError>;

    /// Cover-fit: scale to fill `width`×`height`, then centre-crop the overflow.
    fn resize_cover(&self, image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, BackendError>;

    /// Rasterize SVG markup onto a transparent `width`×`height` canvas.
    fn render_svg(&self, markup: &str, width: u32, height: u32) -> Result<RgbaImage, BackendError>;

    /// Paint `layers` onto `base` in order; later layers end up on top.
    fn composite(&self, base: RgbaImage, layers: &[CompositeOp]) -> Result<RgbaImage, BackendError>;

    fn encode_png(&self, image: &RgbaImage, options: &PngOptions) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::analysis::ChannelStats;
    use image::Rgba;
    use std::sync::Mutex;

    /// Mock backend that records operations and returns synthetic buffers.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        /// Size of every decoded image.
        pub decode_size: Option<(u32, u32)>,
        /// Paths whose decode fails.
        pub failing_paths: Vec<String>,
        /// Make every `normalise` call fail (first step of enhancement).
        pub fail_normalise: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(String),
        Stats,
        Grayscale,
        EdgeMap { max_side: u32 },
        Normalise { lower: f64, upper: f64 },
        Modulate { brightness: f64, saturation: f64, hue: f64 },
        Gamma(f64),
        Linear { multiply: f64, offset: f64 },
        Sharpen { sigma: f64 },
        Convolve,
        ResizeCover { width: u32, height: u32 },
        RenderSvg { width: u32, height: u32, markup: String },
        Composite { layers: Vec<(i64, i64, u32, u32)> },
        EncodePng { compression_level: u8 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_decode_size(width: u32, height: u32) -> Self {
            Self {
                decode_size: Some((width, height)),
                ..Self::default()
            }
        }

        pub fn failing(paths: &[&str]) -> Self {
            Self {
                failing_paths: paths.iter().map(|p| p.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl RasterBackend for MockBackend {
        fn decode(&self, path: &Path) -> Result<RgbaImage, BackendError> {
            let name = path.to_string_lossy().to_string();
            self.record(RecordedOp::Decode(name.clone()));
            if self.failing_paths.contains(&name) {
                return Err(BackendError::Decode {
                    path: name,
                    message: "mock decode failure".to_string(),
                });
            }
            let (w, h) = self.decode_size.unwrap_or((64, 36));
            Ok(RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255])))
        }

        fn stats(&self, _image: &RgbaImage) -> Result<ImageStats, BackendError> {
            self.record(RecordedOp::Stats);
            let channel = ChannelStats {
                mean: 128.0,
                min: 0.0,
                max: 255.0,
                stdev: 60.0,
            };
            Ok(ImageStats {
                channels: vec![channel; 4],
            })
        }

        fn grayscale(&self, image: &RgbaImage) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::Grayscale);
            Ok(vec![128; (image.width() * image.height()) as usize])
        }

        fn edge_map(&self, _image: &RgbaImage, max_side: u32) -> Result<EdgeMap, BackendError> {
            self.record(RecordedOp::EdgeMap { max_side });
            Ok(EdgeMap {
                buffer: vec![0; 16],
                width: 4,
                height: 4,
            })
        }

        fn normalise(&self, image: RgbaImage, range: NormaliseRange) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::Normalise {
                lower: range.lower,
                upper: range.upper,
            });
            if self.fail_normalise {
                return Err(BackendError::ProcessingFailed("mock normalise failure".to_string()));
            }
            Ok(image)
        }

        fn modulate(&self, image: RgbaImage, params: &ModulateParams) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::Modulate {
                brightness: params.brightness,
                saturation: params.saturation,
                hue: params.hue,
            });
            Ok(image)
        }

        fn gamma(&self, image: RgbaImage, gamma: f64) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::Gamma(gamma));
            Ok(image)
        }

        fn linear(&self, image: RgbaImage, params: &LinearParams) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::Linear {
                multiply: params.multiply,
                offset: params.offset,
            });
            Ok(image)
        }

        fn sharpen(&self, image: RgbaImage, params: &Sharpen) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::Sharpen { sigma: params.sigma });
            Ok(image)
        }

        fn convolve(&self, image: RgbaImage, _kernel: &Kernel) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::Convolve);
            Ok(image)
        }

        fn resize_cover(&self, _image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::ResizeCover { width, height });
            Ok(RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255])))
        }

        fn render_svg(&self, markup: &str, width: u32, height: u32) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::RenderSvg {
                width,
                height,
                markup: markup.to_string(),
            });
            Ok(RgbaImage::new(width, height))
        }

        fn composite(&self, base: RgbaImage, layers: &[CompositeOp]) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::Composite {
                layers: layers
                    .iter()
                    .map(|l| (l.left, l.top, l.image.width(), l.image.height()))
                    .collect(),
            });
            Ok(base)
        }

        fn encode_png(&self, _image: &RgbaImage, options: &PngOptions) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::EncodePng {
                compression_level: options.compression_level,
            });
            // Higher levels produce smaller mock output.
            Ok(vec![0; 1000 - options.compression_level as usize * 10])
        }
    }

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::with_decode_size(800, 600);

        let img = backend.decode(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(img.dimensions(), (800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Decode(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_fails_configured_paths() {
        let backend = MockBackend::failing(&["/bad.jpg"]);
        assert!(backend.decode(Path::new("/bad.jpg")).is_err());
        assert!(backend.decode(Path::new("/good.jpg")).is_ok());
    }

    #[test]
    fn mock_records_resize_cover() {
        let backend = MockBackend::new();
        let src = RgbaImage::new(10, 10);

        let out = backend.resize_cover(&src, 426, 360).unwrap();
        assert_eq!(out.dimensions(), (426, 360));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::ResizeCover {
                width: 426,
                height: 360,
            }]
        );
    }

    #[test]
    fn mock_records_composite_layers_in_order() {
        let backend = MockBackend::new();
        let layers = vec![
            CompositeOp::over(RgbaImage::new(5, 5), 0, 0),
            CompositeOp::over(RgbaImage::new(7, 3), 10, -2),
        ];

        backend.composite(RgbaImage::new(20, 20), &layers).unwrap();
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Composite {
                layers: vec![(0, 0, 5, 5), (10, -2, 7, 3)],
            }]
        );
    }
}
