//! End-to-end runs of the thumbnail pipeline with the real backend.
//!
//! Inputs are synthetic solid-colour PNGs so the output can be checked by
//! sampling pixels at known slot and divider positions.

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thumbforge::compose::{
    TextEffect, TextOverlay, TextPosition, ThumbnailRequest, Tilt, create_thumbnail, determine_layout,
};
use thumbforge::imaging::RustBackend;
use thumbforge::layout::Catalog;

fn solid(dir: &Path, name: &str, w: u32, h: u32, rgb: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(w, h, Rgb(rgb)).save(&path).unwrap();
    path
}

fn load(path: &Path) -> RgbaImage {
    image::open(path).unwrap().to_rgba8()
}

fn px(img: &RgbaImage, x: u32, y: u32) -> Rgba<u8> {
    *img.get_pixel(x, y)
}

fn backend() -> RustBackend {
    RustBackend::default()
}

/// Write the thumbnail for `request` under `dir` as `name.png` and load it back.
fn render(dir: &Path, name: &str, request: ThumbnailRequest) -> RgbaImage {
    let request = ThumbnailRequest {
        output_name: Some(name.to_string()),
        youtube_optimize: false,
        ..request
    };
    let result = create_thumbnail(&backend(), &Catalog::standard(), &request, dir);
    assert!(result.success, "{:?}", result.error);
    let img = load(&result.output_path.unwrap());
    assert_eq!(img.dimensions(), (1280, 720));
    img
}

fn is_green(p: Rgba<u8>) -> bool {
    p[1] > 200 && p[0] < 60 && p[2] < 60
}

#[test]
fn two_images_side_by_side() {
    let tmp = TempDir::new().unwrap();
    let red = solid(tmp.path(), "red.png", 320, 180, [255, 0, 0]);
    let blue = solid(tmp.path(), "blue.png", 320, 180, [0, 0, 255]);
    let out_dir = tmp.path().join("out");

    let request = ThumbnailRequest {
        images: vec![red, blue],
        output_name: Some("pair".to_string()),
        ..ThumbnailRequest::default()
    };
    let result = create_thumbnail(&backend(), &Catalog::standard(), &request, &out_dir);

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.layout.as_deref(), Some("1x2"));
    assert_eq!(result.images_used, 2);
    assert!(result.optimization.is_some());

    let path = result.output_path.unwrap();
    assert_eq!(path, out_dir.join("pair.png"));
    let img = load(&path);
    assert_eq!(img.dimensions(), (1280, 720));

    let left = px(&img, 320, 360);
    assert!(left[0] > 200 && left[2] < 60, "left slot {left:?}");
    let right = px(&img, 960, 360);
    assert!(right[2] > 200 && right[0] < 60, "right slot {right:?}");
}

#[test]
fn grid_dividers_are_painted() {
    let tmp = TempDir::new().unwrap();
    let images: Vec<PathBuf> = (0..4)
        .map(|i| solid(tmp.path(), &format!("{i}.png"), 200, 200, [40, 40, 40]))
        .collect();

    let request = ThumbnailRequest {
        images,
        layout_mode: "2x2".to_string(),
        delimiter_width: 20,
        delimiter_color: "#00ff00".to_string(),
        output_name: Some("grid".to_string()),
        youtube_optimize: false,
        ..ThumbnailRequest::default()
    };
    let result = create_thumbnail(&backend(), &Catalog::standard(), &request, tmp.path());
    assert!(result.success, "{:?}", result.error);
    assert!(result.optimization.is_none());

    let img = load(&result.output_path.unwrap());
    for (x, y) in [(640, 100), (640, 360), (300, 360), (1000, 360)] {
        let p = px(&img, x, y);
        assert!(p[1] > 200 && p[0] < 50 && p[2] < 50, "divider at ({x},{y}) is {p:?}");
    }
    let tile = px(&img, 320, 180);
    assert!(tile[1] < 100, "tile {tile:?}");
}

#[test]
fn custom_shape_gaps_use_delimiter_color() {
    let tmp = TempDir::new().unwrap();
    let a = solid(tmp.path(), "a.png", 300, 300, [250, 250, 250]);
    let b = solid(tmp.path(), "b.png", 300, 300, [250, 250, 250]);

    let request = ThumbnailRequest {
        images: vec![a, b],
        layout_mode: "hero-side".to_string(),
        delimiter_width: 10,
        delimiter_color: "#000".to_string(),
        output_name: Some("hero".to_string()),
        ..ThumbnailRequest::default()
    };
    let result = create_thumbnail(&backend(), &Catalog::standard(), &request, tmp.path());
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.layout.as_deref(), Some("hero-side"));

    let img = load(&result.output_path.unwrap());
    let gap = px(&img, 1, 360);
    assert!(gap[0] < 10 && gap[1] < 10 && gap[2] < 10, "gap {gap:?}");
    let hero = px(&img, 400, 360);
    assert!(hero[0] > 200, "hero {hero:?}");
}

#[test]
fn unreadable_image_fails_with_its_index() {
    let tmp = TempDir::new().unwrap();
    let good = solid(tmp.path(), "good.png", 100, 100, [10, 20, 30]);
    let bad = tmp.path().join("bad.png");
    std::fs::write(&bad, b"not a png").unwrap();

    let request = ThumbnailRequest {
        images: vec![good, bad],
        layout_mode: "1x2".to_string(),
        ..ThumbnailRequest::default()
    };
    let result = create_thumbnail(&backend(), &Catalog::standard(), &request, tmp.path());
    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("image 2"), "{error}");
    assert!(std::fs::read_dir(tmp.path()).unwrap().count() == 2);
}

#[test]
fn analysis_of_real_files() {
    let tmp = TempDir::new().unwrap();
    let images = vec![
        solid(tmp.path(), "wide.png", 400, 225, [90, 120, 200]),
        solid(tmp.path(), "square.png", 300, 300, [200, 120, 90]),
        tmp.path().join("missing.png"),
    ];
    let (decision, decoded) = determine_layout(&backend(), &Catalog::standard(), &images);

    assert_eq!(decision.arrangement_id, "1x2");
    let metrics = decision.metrics.unwrap();
    assert_eq!(metrics.image_count, 2);
    assert_eq!((metrics.landscape, metrics.square), (1, 1));
    assert_eq!(metrics.features[0].entropy, 0.0);
    assert!(decoded[0].is_some() && decoded[2].is_none());
}

#[test]
fn text_background_darkens_only_its_band() {
    let tmp = TempDir::new().unwrap();
    let photo = solid(tmp.path(), "light.png", 320, 180, [200, 200, 200]);
    let base = ThumbnailRequest {
        images: vec![photo],
        layout_mode: "1x1".to_string(),
        ..ThumbnailRequest::default()
    };

    let plain = render(tmp.path(), "plain", base.clone());
    let titled = render(
        tmp.path(),
        "titled",
        ThumbnailRequest {
            text_overlay: Some(TextOverlay {
                text: "HELLO".to_string(),
                position: TextPosition::Bottom,
                effect: TextEffect::Background,
                ..TextOverlay::default()
            }),
            ..base
        },
    );

    // Below the baseline, inside the translucent box.
    let (before, after) = (px(&plain, 640, 700), px(&titled, 640, 700));
    for c in 0..3 {
        assert!(i32::from(after[c]) + 40 < i32::from(before[c]), "box {after:?} vs {before:?}");
    }
    assert_eq!(px(&plain, 640, 100), px(&titled, 640, 100));
}

#[test]
fn tilted_divider_leans_across_the_seam() {
    let tmp = TempDir::new().unwrap();
    let images: Vec<PathBuf> = (0..2)
        .map(|i| solid(tmp.path(), &format!("{i}.png"), 200, 200, [40, 40, 40]))
        .collect();
    let base = ThumbnailRequest {
        images,
        layout_mode: "1x2".to_string(),
        delimiter_width: 20,
        delimiter_color: "#00ff00".to_string(),
        ..ThumbnailRequest::default()
    };

    let straight = render(tmp.path(), "straight", base.clone());
    let tilted = render(
        tmp.path(),
        "tilted",
        ThumbnailRequest {
            delimiter_tilt: Tilt::Degrees(20.0),
            ..base
        },
    );

    // 720 * tan(20°) / 2 ≈ 131 px of lean at each end.
    assert!(is_green(px(&straight, 640, 3)));
    assert!(!is_green(px(&straight, 771, 3)));
    assert!(is_green(px(&tilted, 771, 3)), "{:?}", px(&tilted, 771, 3));
    assert!(is_green(px(&tilted, 509, 716)), "{:?}", px(&tilted, 509, 716));
    assert!(!is_green(px(&tilted, 640, 3)));
    assert!(is_green(px(&tilted, 640, 360)));
}

#[test]
fn vignette_darkens_slot_edges() {
    let tmp = TempDir::new().unwrap();
    let photo = solid(tmp.path(), "gray.png", 160, 90, [128, 128, 128]);
    let img = render(
        tmp.path(),
        "vignette",
        ThumbnailRequest {
            images: vec![photo],
            layout_mode: "1x1".to_string(),
            ..ThumbnailRequest::default()
        },
    );

    let centre = px(&img, 640, 360);
    let corner = px(&img, 20, 20);
    assert!(centre[0] > 128, "cosmetic boost brightens the centre: {centre:?}");
    assert!(i32::from(corner[0]) + 10 < i32::from(centre[0]), "corner {corner:?} vs centre {centre:?}");
    assert_eq!(px(&img, 20, 20), px(&img, 1259, 699));
}
