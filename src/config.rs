//! Configuration module.
//!
//! Handles loading, validating, and merging `thumbforge.toml`. Stock defaults
//! are the base layer; the user's file is merged on top, and command-line
//! flags override the merged result.
//!
//! ## Config File Location
//!
//! `thumbforge.toml` in the working directory, or any file passed with
//! `--config`. A missing default file just means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! directory = "thumbnails"  # Where PNGs are written
//! compression_level = 8     # PNG compression (0-9)
//! optimize = true           # Re-encode at max compression, keep the smaller
//!
//! [delimiter]
//! width = 0                 # Divider thickness in pixels (0 = no dividers)
//! tilt = 0.0                # Vertical divider tilt in degrees (-45..45)
//! color = "#ffffff"
//!
//! [enhance]
//! apply = false
//! level = "medium"          # none, light, medium, high
//!
//! [layout]
//! mode = "auto"             # auto, RxC grid id, or a custom shape name
//!
//! [text]
//! font = "sans-serif"
//! size = 72.0
//! color = "#ffffff"
//! opacity = 1.0
//! position = "bottom"
//! effect = "shadow"
//! layer = "overlay"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::compose::overlay::MAX_TILT;
use crate::compose::{HexColor, TextEffect, TextLayer, TextOverlay, TextPosition, ThumbnailRequest, Tilt};
use crate::enhance::EnhanceLevel;
use crate::layout::{Catalog, LayoutMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "thumbforge.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `thumbforge.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeConfig {
    pub output: OutputConfig,
    pub delimiter: DelimiterConfig,
    pub enhance: EnhanceConfig,
    pub layout: LayoutConfig,
    pub text: TextConfig,
    pub processing: ProcessingConfig,
}

impl ForgeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.compression_level > 9 {
            return Err(ConfigError::Validation(
                "output.compression_level must be 0-9".into(),
            ));
        }
        if !self.delimiter.tilt.is_finite() || self.delimiter.tilt.abs() > MAX_TILT {
            return Err(ConfigError::Validation(format!(
                "delimiter.tilt must be between -{MAX_TILT} and {MAX_TILT}"
            )));
        }
        check_color("delimiter.color", &self.delimiter.color)?;
        check_color("text.color", &self.text.color)?;
        if !(8.0..=400.0).contains(&self.text.size) {
            return Err(ConfigError::Validation("text.size must be 8-400".into()));
        }
        if !(0.0..=1.0).contains(&self.text.opacity) {
            return Err(ConfigError::Validation("text.opacity must be 0-1".into()));
        }
        LayoutMode::parse(&self.layout.mode)
            .resolve(&Catalog::standard())
            .map_err(|e| ConfigError::Validation(format!("layout.mode: {e}")))?;
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Request for `images` built from these settings. Text is left out;
    /// see [`TextConfig::overlay`].
    pub fn request(&self, images: Vec<PathBuf>) -> ThumbnailRequest {
        ThumbnailRequest {
            images,
            delimiter_width: self.delimiter.width,
            delimiter_tilt: Tilt::Degrees(self.delimiter.tilt),
            delimiter_color: self.delimiter.color.clone(),
            output_name: None,
            enhance_level: self.enhance.level,
            apply_enhance: self.enhance.apply,
            layout_mode: self.layout.mode.clone(),
            youtube_optimize: self.output.optimize,
            compression_level: self.output.compression_level,
            text_overlay: None,
        }
    }
}

fn check_color(key: &str, value: &str) -> Result<(), ConfigError> {
    value
        .parse::<HexColor>()
        .map(|_| ())
        .map_err(|e| ConfigError::Validation(format!("{key}: {e}")))
}

/// Where and how the PNG is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub directory: String,
    /// PNG compression level (0-9).
    pub compression_level: u8,
    /// Keep the smaller of the normal and maximum-compression encodings.
    pub optimize: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "thumbnails".to_string(),
            compression_level: 8,
            optimize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DelimiterConfig {
    pub width: u32,
    pub tilt: f64,
    pub color: String,
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        Self {
            width: 0,
            tilt: 0.0,
            color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhanceConfig {
    pub apply: bool,
    pub level: EnhanceLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub mode: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: "auto".to_string(),
        }
    }
}

/// Styling for the text overlay. The text itself only comes from the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    pub font: String,
    pub size: f64,
    pub color: String,
    pub opacity: f64,
    pub position: TextPosition,
    pub effect: TextEffect,
    pub layer: TextLayer,
}

impl Default for TextConfig {
    fn default() -> Self {
        let stock = TextOverlay::default();
        Self {
            font: stock.font,
            size: stock.size,
            color: stock.color,
            opacity: stock.opacity,
            position: stock.position,
            effect: stock.effect,
            layer: stock.layer,
        }
    }
}

impl TextConfig {
    pub fn overlay(&self, text: impl Into<String>) -> TextOverlay {
        TextOverlay {
            text: text.into(),
            font: self.font.clone(),
            size: self.size,
            color: self.color.clone(),
            opacity: self.opacity,
            position: self.position,
            effect: self.effect,
            layer: self.layer,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// The stock defaults as a `toml::Value::Table`, the base layer for merging.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ForgeConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value; `Ok(None)` when it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ForgeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ForgeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, merged over stock defaults and validated.
pub fn load_config(path: &Path) -> Result<ForgeConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `thumbforge.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Thumbforge Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory the PNG is written to (created if missing).
directory = "thumbnails"

# PNG compression level (0 = fastest, 9 = smallest).
compression_level = 8

# Encode a second time at maximum compression and keep the smaller file.
optimize = true

# ---------------------------------------------------------------------------
# Dividers between grid cells
# ---------------------------------------------------------------------------
[delimiter]
# Thickness in pixels. 0 disables dividers; images are inset by half of it.
width = 0

# Tilt of vertical dividers in degrees, -45 to 45.
tilt = 0.0

# Divider colour as #RGB or #RRGGBB. Custom arrangements use it as the
# background so the gaps between images read as dividers.
color = "#ffffff"

# ---------------------------------------------------------------------------
# Per-image enhancement
# ---------------------------------------------------------------------------
[enhance]
# Run exposure, colour and sharpness correction on every photo.
apply = false

# Strength: none, light, medium, high.
level = "medium"

# ---------------------------------------------------------------------------
# Layout
# ---------------------------------------------------------------------------
[layout]
# "auto" picks an arrangement from the photos. Otherwise a grid id
# (1x1, 1x2, 1x3, 2x1, 2x2, 2x3, 3x1, 3x2), a custom shape (hero-side,
# corner-grid, banner-split, spotlight, l-shape), or 2-split / 3-split.
mode = "auto"

# ---------------------------------------------------------------------------
# Text overlay styling (the text itself is passed with --text)
# ---------------------------------------------------------------------------
[text]
font = "sans-serif"

# Pixel size, 8 to 400.
size = 72.0

color = "#ffffff"

# 0.0 (invisible) to 1.0 (opaque).
opacity = 1.0

# top, bottom, left, right, center, top-left, top-right, bottom-left, bottom-right
position = "bottom"

# shadow, outline, glow, background, smart-blend, none
effect = "shadow"

# overlay (on top of everything), between or smart-blend (mid-stack)
layer = "overlay"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
