//! # Thumbforge
//!
//! Composes several photos into one 1280×720 video thumbnail. The photos are
//! measured, an arrangement is picked for them (or taken from the caller),
//! every photo is cover-fitted into its slot, and dividers and a text overlay
//! are painted on top before the result is encoded as PNG.
//!
//! # Pipeline
//!
//! ```text
//! 1. Analyze    photos     →  ImageFeature per photo   (statistics, entropy, subject)
//! 2. Select     features   →  LayoutDecision           (rule tables over aggregates)
//! 3. Geometry   arrangement →  SlotRect + DividerLine  (pixel-exact, sanitized input)
//! 4. Compose    slots      →  draw list → PNG          (enhance, cosmetics, overlays)
//! ```
//!
//! Stages 1–3 are pure functions over numbers and can be tested without any
//! pixels. Everything that touches pixels goes through the
//! [`imaging::RasterBackend`] trait, so the compositor can be tested against a
//! recording mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`analysis`] | Per-image features: colour statistics, entropy, prominent subject, orientation |
//! | [`enhance`] | Maps colour analysis and a strength level to enhancement parameters |
//! | [`layout`] | Arrangement catalog, rule-table selector, numeric sanitizing, slot geometry |
//! | [`compose`] | Reconciliation, SVG overlays, and the compositor itself |
//! | [`imaging`] | Raster backend trait, the `image` + `resvg` implementation, operation chains |
//! | [`naming`] | Output file names and path limits |
//! | [`inputs`] | Expands files and directories into the image list |
//! | [`config`] | Layered `thumbforge.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Injected Catalog
//!
//! Arrangements live in a [`layout::Catalog`] value passed to every function
//! that needs one. [`layout::Catalog::standard`] builds the stock set; tests
//! build smaller ones to exercise missing-entry fallbacks.
//!
//! ## Rules as Data
//!
//! Automatic selection is two ordered tables of `{count range, predicate,
//! arrangement, confidence}` evaluated top to bottom, first match wins. The
//! order is the tie-break.
//!
//! ## One Sanitizer
//!
//! Canvas size, padding and count come from callers and may be NaN, negative
//! or absurd. [`layout::GeometryRequest::sanitize`] is the only place they are
//! coerced; the geometry code after it works on plain integers.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, filtering and encoding use the `image` crate; dividers, vignettes
//! and text are SVG rasterized with `resvg`. No system libraries are needed.

pub mod analysis;
pub mod compose;
pub mod config;
pub mod enhance;
pub mod imaging;
pub mod inputs;
pub mod layout;
pub mod naming;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
