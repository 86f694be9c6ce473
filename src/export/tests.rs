//! Unit tests for the compositor and PNG export.

use bevy::prelude::*;
use image::{Rgba, RgbaImage};

use super::*;
use super::Scene;
use crate::annotate::{ShapeStore, ToolSettings};

fn scene<'a>(
    background: Option<&'a RgbaImage>,
    shapes: &'a ShapeStore,
    style: &'a ToolSettings,
) -> Scene<'a> {
    Scene {
        background,
        shapes,
        style,
        font: None,
    }
}

fn opaque_style(stroke: Color) -> ToolSettings {
    ToolSettings {
        stroke_color: stroke,
        stroke_width: 6.0,
        ..Default::default()
    }
}

#[test]
fn test_export_dimensions_ignore_background_size() {
    let store = ShapeStore::default();
    let style = ToolSettings::default();
    let backgrounds = [
        RgbaImage::new(1, 1),
        RgbaImage::new(4000, 3000),
        RgbaImage::new(300, 900),
    ];
    for bg in &backgrounds {
        for density in [1, 2, 3] {
            let image = compose(&scene(Some(bg), &store, &style), density).unwrap();
            assert_eq!(image.dimensions(), (1280 * density, 720 * density));
        }
    }
}

#[test]
fn test_png_export_has_canvas_dimensions() {
    let store = ShapeStore::default();
    let style = ToolSettings::default();
    let bg = RgbaImage::from_pixel(64, 64, Rgba([10, 200, 30, 255]));
    let exported = export_png(&scene(Some(&bg), &store, &style), 2).unwrap();

    assert_eq!((exported.width, exported.height), (2560, 1440));
    assert_eq!(&exported.bytes[..8], b"\x89PNG\r\n\x1a\n");
    let decoded = image::load_from_memory(&exported.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (2560, 1440));
}

#[test]
fn test_invalid_density_is_rejected() {
    let store = ShapeStore::default();
    let style = ToolSettings::default();
    for density in [0, 9, 100] {
        let err = compose(&scene(None, &store, &style), density).unwrap_err();
        assert!(matches!(err, ExportError::InvalidDensity(d) if d == density));
    }
}

#[test]
fn test_canvas_is_transparent_without_background() {
    let store = ShapeStore::default();
    let style = ToolSettings::default();
    let image = compose(&scene(None, &store, &style), 1).unwrap();
    assert_eq!(image.get_pixel(640, 360), &Rgba([0, 0, 0, 0]));
}

#[test]
fn test_background_is_stretched_to_fill() {
    // Left half black, right half white, at a non-16:9 aspect ratio
    let mut bg = RgbaImage::new(2, 5);
    for y in 0..5 {
        bg.put_pixel(0, y, Rgba([0, 0, 0, 255]));
        bg.put_pixel(1, y, Rgba([255, 255, 255, 255]));
    }
    let store = ShapeStore::default();
    let style = ToolSettings::default();
    let image = compose(&scene(Some(&bg), &store, &style), 1).unwrap();

    assert_eq!(image.get_pixel(5, 5), &Rgba([0, 0, 0, 255]));
    assert_eq!(image.get_pixel(1274, 714), &Rgba([255, 255, 255, 255]));
}

#[test]
fn test_rectangle_fill_is_half_transparent() {
    let mut store = ShapeStore::default();
    store.commit_rectangle(
        Vec2::new(100.0, 100.0),
        Vec2::new(100.0, 50.0),
        Color::srgb(0.0, 0.0, 1.0),
    );
    let bg = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
    let style = ToolSettings::default();
    let image = compose(&scene(Some(&bg), &store, &style), 1).unwrap();

    let inside = image.get_pixel(150, 125);
    assert_eq!(inside[2], 255);
    assert!((126..=129).contains(&inside[0]));
    assert_eq!(image.get_pixel(250, 125), &Rgba([255, 255, 255, 255]));
}

#[test]
fn test_negative_rectangle_covers_same_area() {
    let style = ToolSettings::default();
    let mut forward = ShapeStore::default();
    forward.commit_rectangle(Vec2::new(100.0, 100.0), Vec2::new(100.0, 50.0), Color::WHITE);
    let mut backward = ShapeStore::default();
    backward.commit_rectangle(Vec2::new(200.0, 150.0), Vec2::new(-100.0, -50.0), Color::WHITE);

    let a = compose(&scene(None, &forward, &style), 1).unwrap();
    let b = compose(&scene(None, &backward, &style), 1).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_rectangle_scales_with_density() {
    let mut store = ShapeStore::default();
    store.commit_rectangle(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0), Color::WHITE);
    let style = ToolSettings::default();
    let image = compose(&scene(None, &store, &style), 2).unwrap();

    assert!(image.get_pixel(45, 45)[3] > 0);
    assert_eq!(image.get_pixel(65, 65)[3], 0);
}

#[test]
fn test_strokes_draw_over_rectangles() {
    let mut store = ShapeStore::default();
    store.commit_rectangle(Vec2::new(0.0, 0.0), Vec2::new(200.0, 200.0), Color::srgb(0.0, 0.0, 1.0));
    store.commit_stroke(vec![Vec2::new(20.0, 100.0), Vec2::new(180.0, 100.0)]);
    let style = opaque_style(Color::srgb(1.0, 0.0, 0.0));
    let image = compose(&scene(None, &store, &style), 1).unwrap();

    assert_eq!(image.get_pixel(100, 100), &Rgba([255, 0, 0, 255]));
}

#[test]
fn test_arrows_draw_over_strokes() {
    let mut store = ShapeStore::default();
    store.commit_arrow(
        Vec2::new(100.0, 20.0),
        Vec2::new(100.0, 180.0),
        Color::srgb(0.0, 1.0, 0.0),
        6.0,
    );
    // Committed later but still drawn underneath the arrow
    store.commit_stroke(vec![Vec2::new(20.0, 100.0), Vec2::new(180.0, 100.0)]);
    let style = opaque_style(Color::srgb(1.0, 0.0, 0.0));
    let image = compose(&scene(None, &store, &style), 1).unwrap();

    assert_eq!(image.get_pixel(100, 100), &Rgba([0, 255, 0, 255]));
}

#[test]
fn test_strokes_use_current_style() {
    let mut store = ShapeStore::default();
    store.commit_stroke(vec![Vec2::new(20.0, 100.0), Vec2::new(180.0, 100.0)]);

    let red = opaque_style(Color::srgb(1.0, 0.0, 0.0));
    let blue = opaque_style(Color::srgb(0.0, 0.0, 1.0));
    let a = compose(&scene(None, &store, &red), 1).unwrap();
    let b = compose(&scene(None, &store, &blue), 1).unwrap();

    assert_eq!(a.get_pixel(100, 100), &Rgba([255, 0, 0, 255]));
    assert_eq!(b.get_pixel(100, 100), &Rgba([0, 0, 255, 255]));
}

#[test]
fn test_single_point_stroke_draws_a_dot() {
    let mut store = ShapeStore::default();
    store.commit_stroke(vec![Vec2::new(50.5, 50.5)]);
    let style = opaque_style(Color::WHITE);
    let image = compose(&scene(None, &store, &style), 1).unwrap();
    assert_eq!(image.get_pixel(50, 50)[3], 255);
}

#[test]
fn test_arrow_head_is_wider_than_shaft() {
    let mut store = ShapeStore::default();
    store.commit_arrow(Vec2::new(100.0, 300.0), Vec2::new(400.0, 300.0), Color::WHITE, 1.0);
    let style = ToolSettings::default();
    let image = compose(&scene(None, &store, &style), 2).unwrap();

    // Shaft is 2px wide at density 2; the head is 20px wide near its base
    assert_eq!(image.get_pixel(400, 606)[3], 0);
    assert!(image.get_pixel(784, 606)[3] > 0);
}

#[test]
fn test_text_is_skipped_without_font() {
    let mut store = ShapeStore::default();
    store.commit_text(Vec2::new(10.0, 10.0), "Hello".into(), 30.0, Color::WHITE);
    let style = ToolSettings::default();
    let image = compose(&scene(None, &store, &style), 1).unwrap();
    assert!(image.pixels().all(|p| p[3] == 0));

    let mut font = LabelFont::default();
    font.warn_if_missing(&store);
    assert!(font.warned_missing);
}

#[test]
fn test_text_labels_reach_the_export() {
    let font = text::embedded_font().unwrap();
    let bg = RgbaImage::from_pixel(16, 9, Rgba([20, 20, 20, 255]));
    let style = ToolSettings::default();
    let blank = ShapeStore::default();
    let mut labelled = ShapeStore::default();
    labelled.commit_text(Vec2::new(100.0, 100.0), "Hello".into(), 40.0, Color::WHITE);

    let mut scene = Scene {
        background: Some(&bg),
        shapes: &blank,
        style: &style,
        font: Some(&font),
    };
    let plain = compose(&scene, 1).unwrap();
    scene.shapes = &labelled;
    let image = compose(&scene, 1).unwrap();

    assert_ne!(plain, image);
    // Glyphs stay inside the label's box, below and right of its anchor
    assert!(image.pixels().any(|p| p[0] > 200));
    assert_eq!(image.get_pixel(50, 50), plain.get_pixel(50, 50));
}

#[test]
fn test_composition_is_deterministic() {
    let mut store = ShapeStore::default();
    store.commit_rectangle(Vec2::new(5.0, 5.0), Vec2::new(300.0, 200.0), Color::srgb(1.0, 0.8, 0.0));
    store.commit_stroke(vec![Vec2::new(10.0, 10.0), Vec2::new(35.0, 20.0), Vec2::new(50.0, 50.0)]);
    store.commit_arrow(Vec2::new(600.0, 400.0), Vec2::new(700.0, 350.0), Color::BLACK, 4.0);
    let bg = RgbaImage::from_fn(37, 23, |x, y| Rgba([(x * 7) as u8, (y * 11) as u8, 90, 255]));
    let style = ToolSettings::default();

    let a = export_png(&scene(Some(&bg), &store, &style), 2).unwrap();
    let b = export_png(&scene(Some(&bg), &store, &style), 2).unwrap();
    assert_eq!(a.bytes, b.bytes);
}
