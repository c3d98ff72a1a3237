//! Pixel geometry for every arrangement.
//!
//! [`compute_layout`] turns an [`ArrangementSpec`] plus a [`GeometryRequest`]
//! into the slot rectangles (one per image, in image order) and, for grid
//! arrangements, the divider lines between cells. The function is pure and
//! total: malformed input is sanitized first, and a zero-sized canvas or zero
//! count produces an empty [`Layout`].
//!
//! Every region is inset by `padding` on all sides and then floored at
//! [`MIN_SLOT_SIZE`], so a slot never drops below 100×100 even on tiny
//! canvases or with oversized padding.

use super::catalog::{ArrangementKind, ArrangementSpec, CustomShape};
use super::sanitize::{GeometryRequest, MIN_SLOT_SIZE, SanitizedGeometry};
use serde::Serialize;

/// Where one image lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotRect {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DividerOrientation {
    Vertical,
    Horizontal,
}

/// A cell boundary in a grid arrangement.
///
/// `offset` is the boundary coordinate (x for vertical, y for horizontal);
/// `length` is the span along the other axis, always the full canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DividerLine {
    pub orientation: DividerOrientation,
    pub offset: u32,
    pub length: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub slots: Vec<SlotRect>,
    pub dividers: Vec<DividerLine>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Compute slot rectangles and dividers for `spec`.
pub fn compute_layout(spec: &ArrangementSpec, request: &GeometryRequest) -> Layout {
    let geo = request.sanitize();
    if geo.is_empty() {
        return Layout::default();
    }
    match spec.kind {
        ArrangementKind::Grid { rows, cols } => grid_layout(rows, cols, &geo),
        ArrangementKind::Custom { shape } => {
            let n = geo.count.clamp(1, spec.max_images.max(1));
            Layout {
                slots: custom_regions(shape, n, geo.canvas_width, geo.canvas_height)
                    .into_iter()
                    .map(|r| r.inset(geo.padding))
                    .collect(),
                dividers: Vec::new(),
            }
        }
    }
}

// ============================================================================
// Grid
// ============================================================================

fn grid_layout(rows: u32, cols: u32, geo: &SanitizedGeometry) -> Layout {
    let rows = rows.max(1);
    let cols = cols.max(1);
    let cell_w = geo.canvas_width / cols;
    let cell_h = geo.canvas_height / rows;
    let count = geo.count.min((rows * cols) as usize);

    let slots = (0..count as u32)
        .map(|i| {
            let (row, col) = (i / cols, i % cols);
            Region::new(col * cell_w, row * cell_h, cell_w, cell_h).inset(geo.padding)
        })
        .collect();

    let vertical = (1..cols).map(|col| DividerLine {
        orientation: DividerOrientation::Vertical,
        offset: col * cell_w,
        length: geo.canvas_height,
    });
    let horizontal = (1..rows).map(|row| DividerLine {
        orientation: DividerOrientation::Horizontal,
        offset: row * cell_h,
        length: geo.canvas_width,
    });

    Layout {
        slots,
        dividers: vertical.chain(horizontal).collect(),
    }
}

// ============================================================================
// Custom shapes
// ============================================================================

/// An un-padded canvas region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl Region {
    fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    fn inset(self, padding: u32) -> SlotRect {
        SlotRect {
            width: self.w.saturating_sub(2 * padding).max(MIN_SLOT_SIZE),
            height: self.h.saturating_sub(2 * padding).max(MIN_SLOT_SIZE),
            left: self.x + padding,
            top: self.y + padding,
        }
    }
}

/// Split the column `x..x+w` into `n` stacked regions of equal height.
fn stack(x: u32, w: u32, y: u32, h: u32, n: u32) -> impl Iterator<Item = Region> {
    let each = h / n.max(1);
    (0..n).map(move |i| Region::new(x, y + i * each, w, each))
}

/// Split the row `y..y+h` into `n` side-by-side regions of equal width.
fn row(x: u32, w: u32, y: u32, h: u32, n: u32) -> impl Iterator<Item = Region> {
    let each = w / n.max(1);
    (0..n).map(move |i| Region::new(x + i * each, y, each, h))
}

fn custom_regions(shape: CustomShape, n: usize, w: u32, h: u32) -> Vec<Region> {
    let full = Region::new(0, 0, w, h);
    if n <= 1 {
        return vec![full];
    }
    let n = n as u32;
    match shape {
        CustomShape::HeroSide => {
            let hero_w = w * 13 / 20;
            std::iter::once(Region::new(0, 0, hero_w, h))
                .chain(stack(hero_w, w - hero_w, 0, h, n - 1))
                .collect()
        }
        CustomShape::CornerGrid => corner_grid(n, w, h),
        CustomShape::BannerSplit => {
            let banner_h = h * 11 / 20;
            std::iter::once(Region::new(0, 0, w, banner_h))
                .chain(row(0, w, banner_h, h - banner_h, n - 1))
                .collect()
        }
        CustomShape::Spotlight => {
            if n < 4 {
                let main_w = w * 3 / 5;
                std::iter::once(Region::new(0, 0, main_w, h))
                    .chain(stack(main_w, w - main_w, 0, h, n - 1))
                    .collect()
            } else {
                let rows = n.div_ceil(2);
                let (cell_w, cell_h) = (w / 2, h / rows);
                (0..n)
                    .map(|i| Region::new((i % 2) * cell_w, (i / 2) * cell_h, cell_w, cell_h))
                    .collect()
            }
        }
        CustomShape::LShape => l_shape(n, w, h),
    }
}

fn corner_grid(n: u32, w: u32, h: u32) -> Vec<Region> {
    let (half_w, half_h) = (w / 2, h / 2);
    match n {
        2 => row(0, w, 0, h, 2).collect(),
        3 => {
            let main_w = w * 2 / 3;
            std::iter::once(Region::new(0, 0, main_w, h))
                .chain(stack(main_w, w - main_w, 0, h, 2))
                .collect()
        }
        4 => (0..4)
            .map(|i| Region::new((i % 2) * half_w, (i / 2) * half_h, half_w, half_h))
            .collect(),
        _ => {
            let center_w = w * 2 / 5;
            let side_w = (w - center_w) / 2;
            let right_x = side_w + center_w;
            std::iter::once(Region::new(side_w, 0, center_w, h))
                .chain(stack(0, side_w, 0, h, 2))
                .chain(stack(right_x, w - right_x, 0, h, 2))
                .collect()
        }
    }
}

/// Main image top-left, a right column spanning the full height and a bottom
/// row under the main image. With three images this is the true L.
fn l_shape(n: u32, w: u32, h: u32) -> Vec<Region> {
    let rest = n - 1;
    let right = rest.div_ceil(2);
    let bottom = rest - right;
    let main_w = if right > 0 { w * 2 / 3 } else { w };
    let main_h = if bottom > 0 { h * 2 / 3 } else { h };

    std::iter::once(Region::new(0, 0, main_w, main_h))
        .chain(stack(main_w, w - main_w, 0, h, right))
        .chain(row(0, main_w, main_h, h - main_h, bottom))
        .collect()
}
