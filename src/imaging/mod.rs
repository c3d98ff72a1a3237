//! Raster processing in pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` decoders with EXIF orientation |
//! | **Statistics / tone** | per-pixel loops over `RgbaImage` |
//! | **Cover-fit** | `Lanczos3` resize + centre crop |
//! | **Dividers, vignette, text** | `usvg` + `resvg` |
//! | **Encode** | `image` PNG encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing raster operations
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level chains combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, RasterBackend};
pub use operations::{analyze_image, enhance_image, finish_slot, plan_enhancement};
pub use params::{BlendMode, CompositeOp, Kernel, LinearParams, ModulateParams, PngOptions};
pub use rust_backend::{RustBackend, supported_input_extensions};
