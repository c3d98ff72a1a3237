//! Numeric sanitizing for caller-supplied geometry input.
//!
//! Canvas size, padding and image count all arrive from outside (CLI flags,
//! config files, JSON requests) and may be `NaN`, infinite or negative. They
//! pass through [`GeometryRequest::sanitize`] exactly once; the geometry math
//! only ever sees a [`SanitizedGeometry`].

/// Canvas width substituted for non-finite input.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1280;
/// Canvas height substituted for non-finite input.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 720;
/// Smallest width or height any slot may have.
pub const MIN_SLOT_SIZE: u32 = 100;
/// Upper bound for canvas sides and padding.
pub const MAX_DIMENSION: u32 = 16_384;

/// `value` if it is finite, otherwise `default`.
pub fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}

/// Raw geometry input, exactly as the caller supplied it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryRequest {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub padding: f64,
    pub count: f64,
}

/// Geometry input after sanitizing. Every field is a finite integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizedGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub padding: u32,
    pub count: usize,
}

impl SanitizedGeometry {
    /// True when the request should produce no slots at all.
    pub fn is_empty(&self) -> bool {
        self.canvas_width == 0 || self.canvas_height == 0 || self.count == 0
    }
}

impl GeometryRequest {
    pub fn new(canvas_width: u32, canvas_height: u32, padding: u32, count: usize) -> Self {
        Self {
            canvas_width: canvas_width as f64,
            canvas_height: canvas_height as f64,
            padding: padding as f64,
            count: count as f64,
        }
    }

    /// Substitute defaults for non-finite values, floor to integers, and map
    /// non-positive canvas dimensions or counts to zero.
    ///
    /// Non-finite canvas dimensions become 1280×720, non-finite padding
    /// becomes 0 and a non-finite count becomes 1. Negative padding is
    /// treated as 0; sizes are capped at [`MAX_DIMENSION`].
    pub fn sanitize(&self) -> SanitizedGeometry {
        let width = finite_or(self.canvas_width, DEFAULT_CANVAS_WIDTH as f64);
        let height = finite_or(self.canvas_height, DEFAULT_CANVAS_HEIGHT as f64);
        let padding = finite_or(self.padding, 0.0);
        let count = finite_or(self.count, 1.0);

        SanitizedGeometry {
            canvas_width: to_dimension(width),
            canvas_height: to_dimension(height),
            padding: to_dimension(padding),
            count: if count >= 1.0 { count.floor() as usize } else { 0 },
        }
    }
}

fn to_dimension(value: f64) -> u32 {
    if value <= 0.0 {
        0
    } else {
        value.floor().min(MAX_DIMENSION as f64) as u32
    }
}
