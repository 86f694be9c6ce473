//! Gizmo rendering of the in-progress gesture and the canvas frame.
//!
//! Committed shapes are part of the canvas texture; only the uncommitted
//! preview is drawn here, converted from canvas to world space.

use bevy::gizmos::prelude::*;
use bevy::prelude::*;

use super::gizmo::AnnotationGizmoGroup;
use super::machine::ToolStateMachine;
use super::state::{AnnotationSettings, Gesture};
use crate::canvas::{CameraParams, canvas_size, canvas_to_world, clamp_to_canvas};
use crate::constants::{ARROW_POINTER_LENGTH, ARROW_POINTER_WIDTH};
use crate::remote::GenerationState;
use crate::theme;

pub fn render_gesture_preview(
    mut gizmos: Gizmos<AnnotationGizmoGroup>,
    machine: Res<ToolStateMachine>,
    settings: Res<AnnotationSettings>,
    camera: CameraParams,
) {
    let style = settings.snapshot();
    let cursor = camera.cursor_canvas_pos().map(clamp_to_canvas);

    match machine.gesture() {
        Gesture::Idle => {}
        Gesture::DrawingStroke(points) => {
            for pair in points.windows(2) {
                gizmos.line_2d(
                    canvas_to_world(pair[0]),
                    canvas_to_world(pair[1]),
                    style.stroke_color,
                );
            }
        }
        Gesture::PlacingArrow(start) => {
            let Some(end) = cursor else {
                return;
            };
            let color = style.stroke_color.with_alpha(theme::PREVIEW_ALPHA);
            gizmos.line_2d(canvas_to_world(*start), canvas_to_world(end), color);

            let direction = (end - *start).normalize_or_zero();
            if direction != Vec2::ZERO {
                let base = end - direction * ARROW_POINTER_LENGTH;
                let half = direction.perp() * (ARROW_POINTER_WIDTH / 2.0);
                let tip = canvas_to_world(end);
                gizmos.line_2d(tip, canvas_to_world(base + half), color);
                gizmos.line_2d(tip, canvas_to_world(base - half), color);
            }
        }
        Gesture::PlacingRect(start) => {
            let Some(end) = cursor else {
                return;
            };
            let a = canvas_to_world(*start);
            let b = canvas_to_world(end);
            let center = (a + b) / 2.0;
            let size = (b - a).abs();
            gizmos.rect_2d(Isometry2d::from_translation(center), size, style.fill_color);
        }
    }
}

/// Outline of the export area, hidden while a generated result is shown.
pub fn render_canvas_frame(
    mut gizmos: Gizmos<AnnotationGizmoGroup>,
    generation: Res<GenerationState>,
) {
    if generation.result.is_some() {
        return;
    }
    gizmos.rect_2d(Isometry2d::IDENTITY, canvas_size(), theme::CANVAS_FRAME);
}
