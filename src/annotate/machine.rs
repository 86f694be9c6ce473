//! Tool state machine: turns pointer events into previews and commits.
//!
//! Every transition is a pure function of the current gesture, the
//! [`ToolSettings`] snapshot and the pointer event. The only side effect is a
//! mutation of the [`ShapeStore`] on commit.

use bevy::prelude::*;

use super::shapes::{ShapeId, ShapeStore};
use super::state::{Gesture, ToolSettings};
use super::tools::AnnotationTool;

/// Synchronous source of label text for the Text tool.
pub trait TextPrompt {
    /// Returns the text the user entered, or `None` if they declined.
    fn request_text(&mut self) -> Option<String>;
}

/// Prompt answered with a fixed string (the toolbar's label field).
pub struct FixedPrompt<'a>(pub &'a str);

impl TextPrompt for FixedPrompt<'_> {
    fn request_text(&mut self) -> Option<String> {
        Some(self.0.to_string())
    }
}

#[derive(Resource, Debug, Default)]
pub struct ToolStateMachine {
    tool: AnnotationTool,
    gesture: Gesture,
}

impl ToolStateMachine {
    pub fn new(tool: AnnotationTool) -> Self {
        Self {
            tool,
            gesture: Gesture::Idle,
        }
    }

    pub fn tool(&self) -> AnnotationTool {
        self.tool
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Activate `tool`. A pending gesture is discarded without committing.
    /// Returns true if a gesture was discarded.
    pub fn set_tool(&mut self, tool: AnnotationTool) -> bool {
        self.tool = tool;
        self.cancel_gesture()
    }

    /// Drop the pending gesture. Returns true if there was one.
    pub fn cancel_gesture(&mut self) -> bool {
        let had_gesture = !self.gesture.is_idle();
        self.gesture = Gesture::Idle;
        had_gesture
    }

    /// Start a gesture, or commit a text label when the Text tool is active.
    ///
    /// Nothing happens until a background image is loaded. A gesture whose
    /// pointer-up was never delivered is replaced by the new one.
    pub fn pointer_down(
        &mut self,
        pos: Vec2,
        has_background: bool,
        settings: &ToolSettings,
        store: &mut ShapeStore,
        prompt: &mut dyn TextPrompt,
    ) -> Option<ShapeId> {
        if !has_background {
            return None;
        }

        self.gesture = Gesture::Idle;
        match self.tool {
            AnnotationTool::Draw => {
                self.gesture = Gesture::DrawingStroke(vec![pos]);
                None
            }
            AnnotationTool::Arrow => {
                self.gesture = Gesture::PlacingArrow(pos);
                None
            }
            AnnotationTool::Rect => {
                self.gesture = Gesture::PlacingRect(pos);
                None
            }
            AnnotationTool::Text => {
                let text = prompt.request_text()?;
                if text.is_empty() {
                    return None;
                }
                Some(store.commit_text(pos, text, settings.font_size, settings.stroke_color))
            }
        }
    }

    /// Feed a pointer position. Only a stroke in progress records it; arrow
    /// and rectangle previews are derived from the anchor and the live pointer.
    /// Returns true if the gesture changed.
    pub fn pointer_move(&mut self, pos: Vec2) -> bool {
        match &mut self.gesture {
            Gesture::DrawingStroke(points) => {
                points.push(pos);
                true
            }
            Gesture::Idle | Gesture::PlacingArrow(_) | Gesture::PlacingRect(_) => false,
        }
    }

    /// Finish the pending gesture and commit its shape.
    pub fn pointer_up(
        &mut self,
        pos: Vec2,
        settings: &ToolSettings,
        store: &mut ShapeStore,
    ) -> Option<ShapeId> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => None,
            Gesture::DrawingStroke(points) => Some(store.commit_stroke(points)),
            Gesture::PlacingArrow(start) => Some(store.commit_arrow(
                start,
                pos,
                settings.stroke_color,
                settings.stroke_width,
            )),
            Gesture::PlacingRect(start) => {
                Some(store.commit_rectangle(start, pos - start, settings.fill_color))
            }
        }
    }
}
