//! Flattening of the background and committed annotations into one image.
//!
//! The compositor is deterministic: identical background, shapes and style
//! always produce identical pixels. The on-screen canvas uses it at density 1
//! and the exporter at the configured density.

mod raster;
pub mod text;

#[cfg(test)]
mod tests;

use std::io::Cursor;

use ab_glyph::FontArc;
use bevy::prelude::*;
use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::annotate::{ShapeStore, ToolSettings};
use crate::constants::{
    ARROW_POINTER_LENGTH, ARROW_POINTER_WIDTH, CANVAS_HEIGHT, CANVAS_WIDTH, MAX_EXPORT_DENSITY,
    RECT_FILL_OPACITY,
};

pub use text::LabelFont;

use raster::{CoverageMask, Rgbaf};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export density must be between 1 and {max}, got {0}", max = MAX_EXPORT_DENSITY)]
    InvalidDensity(u32),
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Everything the compositor draws.
pub struct Scene<'a> {
    pub background: Option<&'a RgbaImage>,
    pub shapes: &'a ShapeStore,
    /// Style applied to freehand strokes
    pub style: &'a ToolSettings,
    pub font: Option<&'a FontArc>,
}

/// Encoded export ready for upload.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Output size in pixels for a density multiplier.
pub fn output_size(density: u32) -> Result<(u32, u32), ExportError> {
    if density == 0 || density > MAX_EXPORT_DENSITY {
        return Err(ExportError::InvalidDensity(density));
    }
    Ok((CANVAS_WIDTH * density, CANVAS_HEIGHT * density))
}

/// Rasterize the scene. Layers are drawn rectangles, strokes, arrows, text.
pub fn compose(scene: &Scene, density: u32) -> Result<RgbaImage, ExportError> {
    let (width, height) = output_size(density)?;
    let scale = density as f32;

    // Background is stretched to fill regardless of its aspect ratio
    let mut canvas = match scene.background {
        Some(bg) if bg.dimensions() == (width, height) => bg.clone(),
        Some(bg) => image::imageops::resize(bg, width, height, FilterType::Triangle),
        None => RgbaImage::new(width, height),
    };

    for rect in scene.shapes.rectangles() {
        let (min, max) = rect.normalized_bounds();
        let mut mask = CoverageMask::new(width, height);
        mask.fill_box(min * scale, max * scale);
        let mut fill = to_rgbaf(rect.fill);
        fill[3] *= RECT_FILL_OPACITY;
        mask.composite(&mut canvas, fill);
    }

    let stroke_color = to_rgbaf(scene.style.stroke_color);
    let stroke_radius = scene.style.stroke_width * scale / 2.0;
    for stroke in scene.shapes.strokes() {
        let mut mask = CoverageMask::new(width, height);
        match stroke.points.as_slice() {
            [] => continue,
            [only] => mask.stamp_capsule(*only * scale, *only * scale, stroke_radius),
            points => {
                for pair in points.windows(2) {
                    mask.stamp_capsule(pair[0] * scale, pair[1] * scale, stroke_radius);
                }
            }
        }
        mask.composite(&mut canvas, stroke_color);
    }

    for arrow in scene.shapes.arrows() {
        let mut mask = CoverageMask::new(width, height);
        let start = arrow.start * scale;
        let tip = arrow.end * scale;
        let radius = arrow.stroke_width * scale / 2.0;
        let dir = (tip - start).normalize_or_zero();
        if dir == Vec2::ZERO {
            mask.stamp_capsule(start, tip, radius);
        } else {
            let head_length = (ARROW_POINTER_LENGTH * scale).min(tip.distance(start));
            let base = tip - dir * head_length;
            let half_width = dir.perp() * (ARROW_POINTER_WIDTH * scale / 2.0);
            mask.stamp_capsule(start, base, radius);
            mask.stamp_triangle(tip, base + half_width, base - half_width);
        }
        mask.composite(&mut canvas, to_rgbaf(arrow.color));
    }

    if let Some(font) = scene.font {
        for label in scene.shapes.texts() {
            let mut mask = CoverageMask::new(width, height);
            text::draw_text(
                &mut mask,
                font,
                &label.content,
                label.anchor * scale,
                label.font_size * scale,
            );
            mask.composite(&mut canvas, to_rgbaf(label.color));
        }
    }

    Ok(canvas)
}

/// Compose the scene and encode it as PNG.
pub fn export_png(scene: &Scene, density: u32) -> Result<ExportedImage, ExportError> {
    let image = compose(scene, density)?;
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    debug!(
        "Exported {}x{} composition ({} bytes)",
        image.width(),
        image.height(),
        bytes.len()
    );
    Ok(ExportedImage {
        bytes,
        width: image.width(),
        height: image.height(),
    })
}

fn to_rgbaf(color: Color) -> Rgbaf {
    let c = color.to_srgba();
    [c.red, c.green, c.blue, c.alpha]
}

impl LabelFont {
    /// Log a warning the first time labels exist but cannot be drawn.
    pub fn warn_if_missing(&mut self, shapes: &ShapeStore) {
        if self.font.is_none() && !shapes.texts().is_empty() && !self.warned_missing {
            warn!("No label font loaded; text annotations are left out of the canvas");
            self.warned_missing = true;
        }
    }
}
