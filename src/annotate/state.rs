//! State resources for tracking annotation tool state.

use bevy::prelude::*;

use crate::annotate::shapes::ShapeId;
use crate::constants::{DEFAULT_LABEL_TEXT, FONT_SIZE_RANGE, STROKE_WIDTH_RANGE};

/// The one uncommitted shape a tool may be building.
///
/// Each variant belongs to exactly one tool, so two kinds of pending data can
/// never be active at the same time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    DrawingStroke(Vec<Vec2>),
    PlacingArrow(Vec2),
    PlacingRect(Vec2),
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// Immutable styling snapshot handed to every commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub stroke_color: Color,
    pub fill_color: Color,
    pub stroke_width: f32,
    pub font_size: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            stroke_color: Color::srgb_u8(0xff, 0x00, 0x00),
            fill_color: Color::srgb_u8(0xff, 0xcc, 0x00),
            stroke_width: 3.0,
            font_size: 30.0,
        }
    }
}

/// Toolbar-editable annotation settings
#[derive(Resource)]
pub struct AnnotationSettings {
    pub stroke_color: Color,
    pub fill_color: Color,
    pub stroke_width: f32,
    pub font_size: f32,
    /// Answer given to the label prompt when the Text tool is used
    pub label_text: String,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        let defaults = ToolSettings::default();
        Self {
            stroke_color: defaults.stroke_color,
            fill_color: defaults.fill_color,
            stroke_width: defaults.stroke_width,
            font_size: defaults.font_size,
            label_text: DEFAULT_LABEL_TEXT.to_string(),
        }
    }
}

impl AnnotationSettings {
    /// Take a snapshot with sizes clamped to the toolbar ranges.
    pub fn snapshot(&self) -> ToolSettings {
        ToolSettings {
            stroke_color: self.stroke_color,
            fill_color: self.fill_color,
            stroke_width: self
                .stroke_width
                .clamp(*STROKE_WIDTH_RANGE.start(), *STROKE_WIDTH_RANGE.end()),
            font_size: self
                .font_size
                .clamp(*FONT_SIZE_RANGE.start(), *FONT_SIZE_RANGE.end()),
        }
    }
}

/// Text label currently being dragged, with the last pointer position seen.
#[derive(Resource, Default)]
pub struct TextDragState {
    pub dragging: Option<(ShapeId, Vec2)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gesture_is_idle() {
        assert!(Gesture::default().is_idle());
        assert!(!Gesture::PlacingArrow(Vec2::ZERO).is_idle());
    }

    #[test]
    fn test_settings_defaults_match_snapshot_defaults() {
        let settings = AnnotationSettings::default();
        assert_eq!(settings.snapshot(), ToolSettings::default());
        assert_eq!(settings.label_text, DEFAULT_LABEL_TEXT);
    }

    #[test]
    fn test_snapshot_clamps_sizes() {
        let settings = AnnotationSettings {
            stroke_width: 50.0,
            font_size: 4.0,
            ..Default::default()
        };
        let snapshot = settings.snapshot();
        assert_eq!(snapshot.stroke_width, 20.0);
        assert_eq!(snapshot.font_size, 12.0);
    }
}
