//! Pure calculation functions for raster dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Largest window of `source` that has the aspect ratio of `target`.
///
/// Cover-fit crops the source to this window first and then resizes the
/// window to the target, so the resize never works on more pixels than the
/// source has. Both sides stay within the source and at least 1.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Crop window (one side matches the source)
pub fn calculate_cover_crop(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let (tgt_w, tgt_h) = (target.0.max(1), target.1.max(1));

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: keep full height, trim the sides
        let w = (src_h as f64 * tgt_aspect).round() as u32;
        (w.clamp(1, src_w), src_h)
    } else {
        // Source is taller: keep full width, trim top and bottom
        let h = (src_w as f64 / tgt_aspect).round() as u32;
        (src_w, h.clamp(1, src_h))
    }
}

/// Top-left corner of a centred `target` window inside `filled`.
pub fn center_crop_offset(filled: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (
        filled.0.saturating_sub(target.0) / 2,
        filled.1.saturating_sub(target.1) / 2,
    )
}

/// Scale `source` down so its longer side is at most `max_side`.
///
/// Never upscales; both sides stay at least 1.
pub fn fit_inside(source: (u32, u32), max_side: u32) -> (u32, u32) {
    let (w, h) = source;
    let longer = w.max(h);
    if longer <= max_side || longer == 0 {
        return (w.max(1), h.max(1));
    }
    let scale = max_side as f64 / longer as f64;
    (
        ((w as f64 * scale).round() as u32).max(1),
        ((h as f64 * scale).round() as u32).max(1),
    )
}

/// Visible part of a layer placed at `(left, top)` on a `base` canvas.
///
/// Returns `(src_x, src_y, dst_x, dst_y, width, height)`, or `None` when the
/// layer lies entirely outside the canvas.
pub fn clip_layer(
    base: (u32, u32),
    layer: (u32, u32),
    left: i64,
    top: i64,
) -> Option<(u32, u32, u32, u32, u32, u32)> {
    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + layer.0 as i64).min(base.0 as i64);
    let y1 = (top + layer.1 as i64).min(base.1 as i64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((
        (x0 - left) as u32,
        (y0 - top) as u32,
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_cover_crop tests
    // =========================================================================

    #[test]
    fn crop_wider_source_for_portrait_target() {
        // 800x600 (4:3) → 400x500 target: full height, width = 600 * 0.8 = 480
        assert_eq!(calculate_cover_crop((800, 600), (400, 500)), (480, 600));
    }

    #[test]
    fn crop_taller_source_for_landscape_slot() {
        // 600x800 (3:4) → 640x360 slot: full width, height = 600 * 9/16 = 338
        assert_eq!(calculate_cover_crop((600, 800), (640, 360)), (600, 338));
    }

    #[test]
    fn crop_same_aspect_ratio_keeps_everything() {
        assert_eq!(calculate_cover_crop((1920, 1080), (1280, 720)), (1920, 1080));
    }

    #[test]
    fn crop_tiny_source_is_not_enlarged() {
        assert_eq!(calculate_cover_crop((10, 10), (426, 360)), (10, 8));
    }

    #[test]
    fn crop_extreme_strip_stays_within_source() {
        // A 20000x2 strip only contributes a 4x2 window to a 16:9 slot.
        assert_eq!(calculate_cover_crop((20_000, 2), (1280, 720)), (4, 2));
        assert_eq!(calculate_cover_crop((2, 20_000), (1280, 720)), (2, 1));
    }

    #[test]
    fn crop_zero_source_does_not_divide_by_zero() {
        assert_eq!(calculate_cover_crop((0, 0), (100, 100)), (1, 1));
    }

    // =========================================================================
    // center_crop_offset / fit_inside
    // =========================================================================

    #[test]
    fn crop_offset_centres_window() {
        assert_eq!(center_crop_offset((800, 600), (480, 600)), (160, 0));
        assert_eq!(center_crop_offset((600, 800), (600, 338)), (0, 231));
    }

    #[test]
    fn fit_inside_scales_longer_side() {
        assert_eq!(fit_inside((4000, 3000), 200), (200, 150));
        assert_eq!(fit_inside((900, 1600), 200), (113, 200));
    }

    #[test]
    fn fit_inside_never_upscales() {
        assert_eq!(fit_inside((120, 80), 200), (120, 80));
    }

    // =========================================================================
    // clip_layer
    // =========================================================================

    #[test]
    fn clip_fully_inside() {
        assert_eq!(
            clip_layer((1280, 720), (100, 50), 10, 20),
            Some((0, 0, 10, 20, 100, 50))
        );
    }

    #[test]
    fn clip_hanging_off_top_left() {
        assert_eq!(
            clip_layer((1280, 720), (100, 50), -30, -10),
            Some((30, 10, 0, 0, 70, 40))
        );
    }

    #[test]
    fn clip_hanging_off_bottom_right() {
        assert_eq!(
            clip_layer((1280, 720), (100, 50), 1250, 700),
            Some((0, 0, 1250, 700, 30, 20))
        );
    }

    #[test]
    fn clip_outside_is_none() {
        assert_eq!(clip_layer((1280, 720), (100, 50), 1280, 0), None);
        assert_eq!(clip_layer((1280, 720), (100, 50), -100, 0), None);
    }
}
