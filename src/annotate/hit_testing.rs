//! Hit testing for draggable text labels.

use bevy::prelude::*;

use super::shapes::{ShapeId, ShapeStore, TextLabel};

/// Approximate glyph advance as a fraction of the font size
const CHAR_WIDTH_FACTOR: f32 = 0.6;

/// Approximate bounding box of a label in canvas space (min, max corners).
pub fn text_bounds(label: &TextLabel) -> (Vec2, Vec2) {
    let chars = label.content.chars().count().max(1) as f32;
    let size = Vec2::new(chars * label.font_size * CHAR_WIDTH_FACTOR, label.font_size);
    (label.anchor, label.anchor + size)
}

pub fn point_in_text(point: Vec2, label: &TextLabel) -> bool {
    let (min, max) = text_bounds(label);
    point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
}

/// Topmost label under `point`. Later labels are drawn over earlier ones.
pub fn text_at(store: &ShapeStore, point: Vec2) -> Option<ShapeId> {
    store
        .texts()
        .iter()
        .rev()
        .find(|label| point_in_text(point, label))
        .map(|label| label.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_bounds_grow_with_content() {
        let mut store = ShapeStore::default();
        let id = store.commit_text(Vec2::new(100.0, 50.0), "abcd".into(), 20.0, Color::BLACK);
        let label = store.text(id).cloned().unwrap();

        let (min, max) = text_bounds(&label);
        assert_eq!(min, Vec2::new(100.0, 50.0));
        assert_eq!(max, Vec2::new(148.0, 70.0));
    }

    #[test]
    fn test_point_in_text() {
        let mut store = ShapeStore::default();
        let id = store.commit_text(Vec2::new(100.0, 50.0), "abcd".into(), 20.0, Color::BLACK);
        let label = store.text(id).cloned().unwrap();

        assert!(point_in_text(Vec2::new(110.0, 60.0), &label));
        assert!(!point_in_text(Vec2::new(90.0, 60.0), &label));
        assert!(!point_in_text(Vec2::new(110.0, 80.0), &label));
    }

    #[test]
    fn test_text_at_prefers_topmost_label() {
        let mut store = ShapeStore::default();
        let below = store.commit_text(Vec2::new(0.0, 0.0), "first".into(), 30.0, Color::BLACK);
        let above = store.commit_text(Vec2::new(10.0, 10.0), "second".into(), 30.0, Color::BLACK);

        assert_eq!(text_at(&store, Vec2::new(20.0, 20.0)), Some(above));
        assert_eq!(text_at(&store, Vec2::new(2.0, 2.0)), Some(below));
        assert_eq!(text_at(&store, Vec2::new(500.0, 500.0)), None);
    }
}
