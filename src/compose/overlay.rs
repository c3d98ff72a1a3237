//! SVG markup for everything drawn on top of the photos.
//!
//! Dividers, the per-slot vignette and the text overlay are all expressed as
//! canvas-sized SVG documents and rasterized through
//! [`RasterBackend::render_svg`](crate::imaging::RasterBackend::render_svg).
//! Nothing in here touches pixels.
//!
//! ## Text placement
//!
//! | Position | Horizontal | Vertical |
//! |---|---|---|
//! | `top` / `bottom` | centred | 40 px from the edge |
//! | `left` / `right` | 40 px from the edge | centred |
//! | `center` | centred | centred |
//! | corner variants | 40 px from both edges | 40 px from both edges |

use crate::layout::{DividerLine, DividerOrientation};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;
use thiserror::Error;

/// Distance between text and the canvas edge.
pub const TEXT_MARGIN: f64 = 40.0;
/// Largest divider tilt in either direction, in degrees.
pub const MAX_TILT: f64 = 45.0;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid color '{0}': expected #RGB or #RRGGBB")]
pub struct InvalidColor(pub String);

/// An opaque sRGB colour parsed from `#RGB` or `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const WHITE: HexColor = HexColor { r: 255, g: 255, b: 255 };

    pub fn rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl FromStr for HexColor {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i * len..(i + 1) * len], 16);
        match hex.len() {
            3 => {
                let v = |i| channel(i, 1).map(|n| n * 17).map_err(|_| err());
                Ok(Self { r: v(0)?, g: v(1)?, b: v(2)? })
            }
            6 => {
                let v = |i| channel(i, 2).map_err(|_| err());
                Ok(Self { r: v(0)?, g: v(1)?, b: v(2)? })
            }
            _ => Err(err()),
        }
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Divider tilt as supplied by the caller: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tilt {
    Degrees(f64),
    Text(String),
}

impl Tilt {
    /// The usable angle: non-numeric or non-finite input is 0, and the
    /// result is clamped to ±45°.
    pub fn degrees(&self) -> f64 {
        let raw = match self {
            Tilt::Degrees(d) => *d,
            Tilt::Text(s) => s.trim().parse().unwrap_or(0.0),
        };
        if raw.is_finite() {
            raw.clamp(-MAX_TILT, MAX_TILT)
        } else {
            0.0
        }
    }
}

impl Default for Tilt {
    fn default() -> Self {
        Tilt::Degrees(0.0)
    }
}

fn svg_open(out: &mut String, width: u32, height: u32) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
}

/// Canvas-sized markup for the grid dividers.
///
/// Vertical dividers are centred on their boundary. A non-zero tilt turns
/// them into parallelograms whose top and bottom edges are offset by
/// `height·tan(tilt)` in total; horizontal dividers are never tilted.
pub fn divider_svg(
    dividers: &[DividerLine],
    thickness: u32,
    tilt_degrees: f64,
    color: HexColor,
    canvas: (u32, u32),
) -> String {
    let mut out = String::new();
    svg_open(&mut out, canvas.0, canvas.1);
    let t = thickness as f64;
    for d in dividers {
        let start = d.offset as f64 - t / 2.0;
        let len = d.length as f64;
        match d.orientation {
            DividerOrientation::Vertical => {
                let half_run = len * tilt_degrees.to_radians().tan() / 2.0;
                let _ = write!(
                    out,
                    r#"<polygon points="{:.2},0 {:.2},0 {:.2},{len} {:.2},{len}" fill="{color}"/>"#,
                    start + half_run,
                    start + t + half_run,
                    start + t - half_run,
                    start - half_run,
                );
            }
            DividerOrientation::Horizontal => {
                let _ = write!(
                    out,
                    r#"<rect x="0" y="{start:.2}" width="{len}" height="{t}" fill="{color}"/>"#
                );
            }
        }
    }
    out.push_str("</svg>");
    out
}

/// Radial vignette: transparent centre fading to 15% black at the edge.
pub fn vignette_svg(width: u32, height: u32) -> String {
    let mut out = String::new();
    svg_open(&mut out, width, height);
    out.push_str(concat!(
        r#"<defs><radialGradient id="vignette" cx="50%" cy="50%" r="50%">"#,
        r#"<stop offset="0%" stop-color="black" stop-opacity="0"/>"#,
        r#"<stop offset="100%" stop-color="black" stop-opacity="0.15"/>"#,
        r#"</radialGradient></defs>"#,
        r#"<rect width="100%" height="100%" fill="url(#vignette)"/></svg>"#,
    ));
    out
}

// ============================================================================
// Text overlay
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TextPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TextEffect {
    #[default]
    Shadow,
    Outline,
    Glow,
    Background,
    SmartBlend,
    #[serde(rename = "none")]
    #[value(name = "none")]
    Plain,
}

/// Where the rendered text goes in the draw list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TextLayer {
    /// On top of everything.
    #[default]
    Overlay,
    /// Halfway up the stack.
    Between,
    SmartBlend,
}

impl TextLayer {
    /// Draw-list index at which the text layer is inserted.
    pub fn insert_index(self, len: usize) -> usize {
        match self {
            TextLayer::Overlay => len,
            TextLayer::Between | TextLayer::SmartBlend => len / 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextOverlay {
    pub text: String,
    /// Font family name; any family the font database knows, or a generic one.
    pub font: String,
    /// Pixel size, clamped to 8..=400 when rendered.
    pub size: f64,
    pub color: String,
    /// 0..=1.
    pub opacity: f64,
    pub position: TextPosition,
    pub effect: TextEffect,
    pub layer: TextLayer,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: "sans-serif".to_string(),
            size: 72.0,
            color: "#ffffff".to_string(),
            opacity: 1.0,
            position: TextPosition::default(),
            effect: TextEffect::default(),
            layer: TextLayer::default(),
        }
    }
}

impl TextOverlay {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn clamped_size(&self) -> f64 {
        if self.size.is_finite() {
            self.size.clamp(8.0, 400.0)
        } else {
            72.0
        }
    }

    fn clamped_opacity(&self) -> f64 {
        if self.opacity.is_finite() {
            self.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Escape text for use in SVG character data and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Baseline origin and `text-anchor` for a position on a `width`×`height` canvas.
pub fn text_anchor(position: TextPosition, size: f64, width: u32, height: u32) -> (f64, f64, &'static str) {
    use TextPosition::*;
    let (w, h) = (width as f64, height as f64);
    let (x, anchor) = match position {
        Left | TopLeft | BottomLeft => (TEXT_MARGIN, "start"),
        Right | TopRight | BottomRight => (w - TEXT_MARGIN, "end"),
        Top | Bottom | Center => (w / 2.0, "middle"),
    };
    let y = match position {
        Top | TopLeft | TopRight => TEXT_MARGIN + size * 0.8,
        Bottom | BottomLeft | BottomRight => h - TEXT_MARGIN,
        Left | Right | Center => h / 2.0 + size * 0.35,
    };
    (x, y, anchor)
}

/// Canvas-sized markup for the text overlay.
pub fn text_overlay_svg(overlay: &TextOverlay, width: u32, height: u32) -> Result<String, InvalidColor> {
    let color: HexColor = overlay.color.parse()?;
    let size = overlay.clamped_size();
    let opacity = overlay.clamped_opacity();
    let (x, y, anchor) = text_anchor(overlay.position, size, width, height);

    let mut out = String::new();
    svg_open(&mut out, width, height);

    let mut filter = "";
    let mut stroke = String::new();
    match overlay.effect {
        TextEffect::Shadow => {
            out.push_str(SHADOW_FILTER);
            filter = r#" filter="url(#shadow)""#;
        }
        TextEffect::Glow => {
            out.push_str(
                r#"<defs><filter id="glow" x="-20%" y="-20%" width="140%" height="140%"><feGaussianBlur stdDeviation="6" result="blur"/><feMerge><feMergeNode in="blur"/><feMergeNode in="SourceGraphic"/></feMerge></filter></defs>"#,
            );
            filter = r#" filter="url(#glow)""#;
        }
        TextEffect::Outline => {
            stroke = format!(
                r##" stroke="#000000" stroke-width="{:.2}" stroke-linejoin="round" paint-order="stroke""##,
                (size / 18.0).max(1.0)
            );
        }
        TextEffect::Background => {
            let text_w = overlay.text.chars().count() as f64 * size * 0.6;
            let pad = size * 0.3;
            let left = match anchor {
                "start" => x,
                "end" => x - text_w,
                _ => x - text_w / 2.0,
            };
            let _ = write!(
                out,
                r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="8" fill="#000000" fill-opacity="0.5"/>"##,
                left - pad,
                y - size - pad / 2.0,
                text_w + 2.0 * pad,
                size * 1.2 + pad,
            );
        }
        TextEffect::SmartBlend => {
            let top = matches!(
                overlay.position,
                TextPosition::Top | TextPosition::TopLeft | TextPosition::TopRight
            );
            let (y1, y2) = if top { ("100%", "0%") } else { ("0%", "100%") };
            let _ = write!(
                out,
                r##"<defs><linearGradient id="scrim" x1="0" y1="{y1}" x2="0" y2="{y2}"><stop offset="0%" stop-color="#000000" stop-opacity="0"/><stop offset="100%" stop-color="#000000" stop-opacity="0.6"/></linearGradient></defs>"##
            );
            let band = (size * 2.5).min(height as f64);
            let band_y = if top { 0.0 } else { height as f64 - band };
            let _ = write!(
                out,
                r#"<rect x="0" y="{band_y:.2}" width="{width}" height="{band:.2}" fill="url(#scrim)"/>"#
            );
            out.push_str(SHADOW_FILTER);
            filter = r#" filter="url(#shadow)""#;
        }
        TextEffect::Plain => {}
    }

    let _ = write!(
        out,
        r#"<text x="{x:.2}" y="{y:.2}" font-family="{}" font-size="{size:.2}" font-weight="bold" fill="{color}" fill-opacity="{opacity:.3}" text-anchor="{anchor}"{stroke}{filter}>{}</text></svg>"#,
        escape_xml(&overlay.font),
        escape_xml(&overlay.text),
    );
    Ok(out)
}

const SHADOW_FILTER: &str = r##"<defs><filter id="shadow" x="-20%" y="-20%" width="140%" height="140%"><feDropShadow dx="3" dy="3" stdDeviation="4" flood-color="#000000" flood-opacity="0.7"/></filter></defs>"##;

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Colours and tilt
    // =========================================================================

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!("#ff8000".parse::<HexColor>().unwrap(), HexColor { r: 255, g: 128, b: 0 });
        assert_eq!("#F80".parse::<HexColor>().unwrap(), HexColor { r: 255, g: 136, b: 0 });
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["ff0000", "#ff00", "#gg0000", "", "#", "#ff00001"] {
            assert!(bad.parse::<HexColor>().is_err(), "{bad}");
        }
    }

    #[test]
    fn hex_display_is_lowercase_long_form() {
        assert_eq!("#ABC".parse::<HexColor>().unwrap().to_string(), "#aabbcc");
    }

    #[test]
    fn tilt_accepts_numbers_and_numeric_strings() {
        assert_eq!(Tilt::Degrees(12.5).degrees(), 12.5);
        assert_eq!(Tilt::Text(" -8 ".to_string()).degrees(), -8.0);
    }

    #[test]
    fn tilt_invalid_is_zero_and_large_is_clamped() {
        assert_eq!(Tilt::Text("steep".to_string()).degrees(), 0.0);
        assert_eq!(Tilt::Degrees(f64::NAN).degrees(), 0.0);
        assert_eq!(Tilt::Degrees(80.0).degrees(), 45.0);
        assert_eq!(Tilt::Text("-90".to_string()).degrees(), -45.0);
    }

    #[test]
    fn tilt_deserializes_untagged() {
        #[derive(Deserialize)]
        struct Wrapper {
            tilt: Tilt,
        }
        let n: Wrapper = serde_json::from_str(r#"{"tilt": 10}"#).unwrap();
        assert_eq!(n.tilt.degrees(), 10.0);
        let s: Wrapper = serde_json::from_str(r#"{"tilt": "15"}"#).unwrap();
        assert_eq!(s.tilt.degrees(), 15.0);
    }

    // =========================================================================
    // Dividers and vignette
    // =========================================================================

    fn vertical(offset: u32) -> DividerLine {
        DividerLine {
            orientation: DividerOrientation::Vertical,
            offset,
            length: 720,
        }
    }

    #[test]
    fn straight_vertical_divider_is_centred() {
        let svg = divider_svg(&[vertical(640)], 10, 0.0, HexColor::WHITE, (1280, 720));
        assert!(svg.contains(r#"points="635.00,0 645.00,0 645.00,720 635.00,720""#), "{svg}");
        assert!(svg.contains("#ffffff"));
    }

    #[test]
    fn tilted_vertical_divider_is_parallelogram() {
        let svg = divider_svg(&[vertical(640)], 10, 45.0, HexColor::WHITE, (1280, 720));
        // tan(45°) * 720 / 2 = 360
        assert!(svg.contains(r#"points="995.00,0 1005.00,0 285.00,720 275.00,720""#), "{svg}");
    }

    #[test]
    fn horizontal_divider_spans_width() {
        let line = DividerLine {
            orientation: DividerOrientation::Horizontal,
            offset: 360,
            length: 1280,
        };
        let svg = divider_svg(&[line], 6, 30.0, "#f00".parse().unwrap(), (1280, 720));
        assert!(svg.contains(r##"<rect x="0" y="357.00" width="1280" height="6" fill="#ff0000"/>"##), "{svg}");
    }

    #[test]
    fn vignette_uses_radial_gradient() {
        let svg = vignette_svg(426, 360);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="426" height="360""#));
        assert!(svg.contains("stop-opacity=\"0.15\""));
    }

    // =========================================================================
    // Text
    // =========================================================================

    fn overlay(text: &str) -> TextOverlay {
        TextOverlay {
            text: text.to_string(),
            ..TextOverlay::default()
        }
    }

    #[test]
    fn text_is_escaped() {
        let svg = text_overlay_svg(&overlay("Tom & <Jerry>"), 1280, 720).unwrap();
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;"));
        assert!(!svg.contains("<Jerry>"));
    }

    #[test]
    fn bottom_text_is_centred_above_margin() {
        assert_eq!(text_anchor(TextPosition::Bottom, 72.0, 1280, 720), (640.0, 680.0, "middle"));
        assert_eq!(text_anchor(TextPosition::TopRight, 50.0, 1280, 720), (1240.0, 80.0, "end"));
        assert_eq!(text_anchor(TextPosition::Left, 100.0, 1280, 720).2, "start");
    }

    #[test]
    fn effects_emit_their_markup() {
        let with = |effect| {
            text_overlay_svg(&TextOverlay { effect, ..overlay("Hi") }, 1280, 720).unwrap()
        };
        assert!(with(TextEffect::Shadow).contains("feDropShadow"));
        assert!(with(TextEffect::Glow).contains("feGaussianBlur"));
        assert!(with(TextEffect::Outline).contains("paint-order=\"stroke\""));
        assert!(with(TextEffect::Background).contains("fill-opacity=\"0.5\""));
        assert!(with(TextEffect::SmartBlend).contains("linearGradient"));
        let plain = with(TextEffect::Plain);
        assert!(!plain.contains("filter"));
        assert!(!plain.contains("stroke"));
    }

    #[test]
    fn size_and_opacity_are_clamped() {
        let svg = text_overlay_svg(
            &TextOverlay {
                size: 1000.0,
                opacity: 3.0,
                ..overlay("x")
            },
            1280,
            720,
        )
        .unwrap();
        assert!(svg.contains(r#"font-size="400.00""#));
        assert!(svg.contains(r#"fill-opacity="1.000""#));
    }

    #[test]
    fn invalid_text_color_is_an_error() {
        let err = text_overlay_svg(
            &TextOverlay {
                color: "white".to_string(),
                ..overlay("x")
            },
            1280,
            720,
        )
        .unwrap_err();
        assert_eq!(err, InvalidColor("white".to_string()));
    }

    #[test]
    fn layer_insert_positions() {
        assert_eq!(TextLayer::Overlay.insert_index(5), 5);
        assert_eq!(TextLayer::Between.insert_index(5), 2);
        assert_eq!(TextLayer::SmartBlend.insert_index(4), 2);
    }

    #[test]
    fn overlay_deserializes_with_defaults() {
        let o: TextOverlay =
            serde_json::from_str(r#"{"text": "New video", "effect": "none", "position": "top-left"}"#).unwrap();
        assert_eq!(o.effect, TextEffect::Plain);
        assert_eq!(o.position, TextPosition::TopLeft);
        assert_eq!(o.size, 72.0);
        assert_eq!(o.layer, TextLayer::Overlay);
    }
}
