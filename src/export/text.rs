//! TrueType label rendering.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use bevy::prelude::*;

use super::raster::CoverageMask;

/// Font used to rasterize text labels, if one could be loaded.
#[derive(Resource, Default, Clone)]
pub struct LabelFont {
    pub font: Option<FontArc>,
    /// Set once the "no font" warning has been logged
    pub warned_missing: bool,
}

/// Candidate font files in lookup order: the configured path, then the
/// bundled fonts directory.
pub fn font_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = configured {
        candidates.push(path.to_path_buf());
    }
    let fonts_dir = crate::paths::bundled_assets_dir().join("fonts");
    candidates.push(fonts_dir.join("label.ttf"));
    candidates.push(fonts_dir.join("label.otf"));
    candidates
}

/// DejaVu Sans, compiled in so labels render without any font on disk.
static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

pub fn embedded_font() -> Option<FontArc> {
    match FontArc::try_from_slice(EMBEDDED_FONT) {
        Ok(font) => Some(font),
        Err(e) => {
            error!("Embedded label font is invalid: {}", e);
            None
        }
    }
}

/// Load the first candidate that parses as a font.
pub fn load_font(candidates: &[PathBuf]) -> Option<FontArc> {
    for path in candidates {
        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                info!("Loaded label font from {:?}", path);
                return Some(font);
            }
            Err(e) => warn!("Ignoring invalid font {:?}: {}", path, e),
        }
    }
    None
}

/// Rasterize one line of text with its box's top-left corner at `origin`.
pub fn draw_text(mask: &mut CoverageMask, font: &FontArc, text: &str, origin: Vec2, px: f32) {
    let scale = PxScale::from(px);
    let scaled = font.as_scaled(scale);
    let baseline = origin.y + scaled.ascent();
    let mut caret = origin.x;
    let mut prev: Option<GlyphId> = None;

    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let gid = font.glyph_id(ch);
        if let Some(prev) = prev {
            caret += scaled.kern(prev, gid);
        }
        let glyph = gid.with_scale_and_position(scale, point(caret, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                mask.accumulate(x, y, coverage);
            });
        }
        caret += scaled.h_advance(gid);
        prev = Some(gid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_font_is_tried_first() {
        let configured = PathBuf::from("/fonts/custom.ttf");
        let candidates = font_candidates(Some(&configured));
        assert_eq!(candidates.first(), Some(&configured));
        assert!(candidates.len() > 1);
    }

    #[test]
    fn test_missing_fonts_yield_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_font(&[dir.path().join("absent.ttf")]).is_none());
    }

    #[test]
    fn test_embedded_font_parses() {
        let font = embedded_font().unwrap();
        assert_ne!(font.glyph_id('A'), GlyphId(0));
    }

    #[test]
    fn test_garbage_font_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(load_font(&[path]).is_none());
    }
}
