//! Composition: from a request and a set of photos to one encoded thumbnail.
//!
//! - [`reconcile`]: fit the number of supplied images to an arrangement
//! - [`overlay`]: SVG markup for dividers, slot vignettes and text
//! - [`thumbnail`]: the compositor itself, plus the request and result types

pub mod overlay;
pub mod reconcile;
pub mod thumbnail;

pub use overlay::{HexColor, InvalidColor, TextEffect, TextLayer, TextOverlay, TextPosition, Tilt};
pub use reconcile::{Reconciled, fill_cyclic, reconcile};
pub use thumbnail::{
    CANVAS_HEIGHT, CANVAS_WIDTH, OptimizationResult, RenderedThumbnail, ThumbnailError, ThumbnailRequest,
    ThumbnailResult, create_thumbnail, determine_layout, render_thumbnail,
};
