//! Annotation layer drawn over the reference photo.
//!
//! ## Module Structure
//!
//! - [`shapes`] - Committed primitives and the [`ShapeStore`]
//! - [`state`] - Gesture state and toolbar settings
//! - [`machine`] - The [`ToolStateMachine`] turning pointer events into commits
//! - [`tools`] - Tool enum, keyboard shortcuts and cursor icons
//! - [`input`] - Pointer system feeding the machine and dragging labels
//! - [`hit_testing`] - Approximate text label bounds
//! - [`rendering`] - Gizmo preview of the gesture in progress
//! - [`gizmo`] - Gizmo group for previews

mod gizmo;
mod hit_testing;
mod input;
pub mod machine;
mod rendering;
pub mod shapes;
pub mod state;
pub mod tools;


use bevy::prelude::*;

pub use machine::ToolStateMachine;
pub use shapes::ShapeStore;
pub use state::{AnnotationSettings, TextDragState, ToolSettings};
pub use tools::AnnotationTool;

pub struct AnnotatePlugin;

impl Plugin for AnnotatePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShapeStore>()
            .init_resource::<ToolStateMachine>()
            .init_resource::<AnnotationSettings>()
            .init_resource::<TextDragState>()
            .init_gizmo_group::<gizmo::AnnotationGizmoGroup>()
            .add_systems(Startup, gizmo::configure_annotation_gizmos)
            .add_systems(
                Update,
                (
                    tools::handle_tool_shortcuts,
                    input::handle_canvas_pointer,
                    rendering::render_gesture_preview,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (tools::update_cursor_icon, rendering::render_canvas_frame),
            );
    }
}
