//! Committed annotation primitives and the store that owns them.

use bevy::prelude::*;

use super::tools::AnnotationTool;

/// Render key of a committed annotation.
///
/// Ids are derived from the creation time in milliseconds and are strictly
/// increasing within a store, so two commits in the same millisecond still
/// get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(pub u64);

/// Freehand stroke. Styling comes from the current tool settings at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub id: ShapeId,
    pub points: Vec<Vec2>,
    pub tool: AnnotationTool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub id: ShapeId,
    pub start: Vec2,
    pub end: Vec2,
    pub color: Color,
    pub stroke_width: f32,
}

/// Filled rectangle. `size` keeps the sign of the drag direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub id: ShapeId,
    pub origin: Vec2,
    pub size: Vec2,
    pub fill: Color,
}

impl Rectangle {
    /// Top-left and bottom-right corners with the drag direction normalised away.
    pub fn normalized_bounds(&self) -> (Vec2, Vec2) {
        let far = self.origin + self.size;
        (self.origin.min(far), self.origin.max(far))
    }
}

/// Text label anchored at the top-left corner of its text box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub id: ShapeId,
    pub anchor: Vec2,
    pub content: String,
    pub font_size: f32,
    pub color: Color,
}

/// Ordered collections of every committed annotation in the editing session.
///
/// The store only grows through the `commit_*` methods and only shrinks
/// through [`ShapeStore::clear`]. Text labels are the one exception to
/// immutability: they can be repositioned with [`ShapeStore::move_text`].
#[derive(Resource, Debug, Default)]
pub struct ShapeStore {
    strokes: Vec<Stroke>,
    arrows: Vec<Arrow>,
    rectangles: Vec<Rectangle>,
    texts: Vec<TextLabel>,
    last_id: u64,
}

impl ShapeStore {
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn rectangles(&self) -> &[Rectangle] {
        &self.rectangles
    }

    pub fn texts(&self) -> &[TextLabel] {
        &self.texts
    }

    pub fn text(&self, id: ShapeId) -> Option<&TextLabel> {
        self.texts.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.strokes.len() + self.arrows.len() + self.rectangles.len() + self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn commit_stroke(&mut self, points: Vec<Vec2>) -> ShapeId {
        let id = self.allocate_id();
        self.strokes.push(Stroke {
            id,
            points,
            tool: AnnotationTool::Draw,
        });
        id
    }

    pub fn commit_arrow(&mut self, start: Vec2, end: Vec2, color: Color, stroke_width: f32) -> ShapeId {
        let id = self.allocate_id();
        self.arrows.push(Arrow {
            id,
            start,
            end,
            color,
            stroke_width,
        });
        id
    }

    pub fn commit_rectangle(&mut self, origin: Vec2, size: Vec2, fill: Color) -> ShapeId {
        let id = self.allocate_id();
        self.rectangles.push(Rectangle {
            id,
            origin,
            size,
            fill,
        });
        id
    }

    pub fn commit_text(
        &mut self,
        anchor: Vec2,
        content: String,
        font_size: f32,
        color: Color,
    ) -> ShapeId {
        let id = self.allocate_id();
        self.texts.push(TextLabel {
            id,
            anchor,
            content,
            font_size,
            color,
        });
        id
    }

    /// Shift a text label by `delta`. Returns false if no label has that id.
    pub fn move_text(&mut self, id: ShapeId, delta: Vec2) -> bool {
        match self.texts.iter_mut().find(|t| t.id == id) {
            Some(label) => {
                label.anchor += delta;
                true
            }
            None => false,
        }
    }

    /// Remove every committed annotation. Ids are never reused afterwards.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.arrows.clear();
        self.rectangles.clear();
        self.texts.clear();
    }

    fn allocate_id(&mut self) -> ShapeId {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.allocate_id_at(now)
    }

    fn allocate_id_at(&mut self, now_millis: u64) -> ShapeId {
        let id = now_millis.max(self.last_id + 1);
        self.last_id = id;
        ShapeId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_starts_empty() {
        let store = ShapeStore::default();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_ids_are_unique_within_same_millisecond() {
        let mut store = ShapeStore::default();
        let a = store.allocate_id_at(1_000);
        let b = store.allocate_id_at(1_000);
        let c = store.allocate_id_at(999);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_ids_follow_clock_when_it_advances() {
        let mut store = ShapeStore::default();
        assert_eq!(store.allocate_id_at(5_000), ShapeId(5_000));
        assert_eq!(store.allocate_id_at(7_000), ShapeId(7_000));
    }

    #[test]
    fn test_commits_never_share_ids() {
        let mut store = ShapeStore::default();
        let ids = [
            store.commit_stroke(vec![Vec2::ZERO]),
            store.commit_arrow(Vec2::ZERO, Vec2::ONE, Color::BLACK, 3.0),
            store.commit_rectangle(Vec2::ZERO, Vec2::ONE, Color::WHITE),
            store.commit_text(Vec2::ZERO, "hi".into(), 30.0, Color::BLACK),
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut store = ShapeStore::default();
        let before = store.commit_stroke(vec![Vec2::ZERO]);
        store.clear();
        let after = store.commit_stroke(vec![Vec2::ZERO]);
        assert!(after > before);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = ShapeStore::default();
        store.commit_stroke(vec![Vec2::ZERO, Vec2::ONE]);
        store.commit_text(Vec2::ZERO, "label".into(), 30.0, Color::BLACK);
        store.clear();
        assert!(store.is_empty());
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_move_text_shifts_anchor() {
        let mut store = ShapeStore::default();
        let id = store.commit_text(Vec2::new(10.0, 10.0), "label".into(), 30.0, Color::BLACK);
        assert!(store.move_text(id, Vec2::new(5.0, -2.0)));
        assert_eq!(store.text(id).map(|t| t.anchor), Some(Vec2::new(15.0, 8.0)));
    }

    #[test]
    fn test_move_text_unknown_id() {
        let mut store = ShapeStore::default();
        assert!(!store.move_text(ShapeId(42), Vec2::ONE));
    }

    #[test]
    fn test_rectangle_bounds_normalize_negative_extent() {
        let rect = Rectangle {
            id: ShapeId(1),
            origin: Vec2::new(200.0, 150.0),
            size: Vec2::new(-100.0, -50.0),
            fill: Color::WHITE,
        };
        let (min, max) = rect.normalized_bounds();
        assert_eq!(min, Vec2::new(100.0, 100.0));
        assert_eq!(max, Vec2::new(200.0, 150.0));
    }
}
