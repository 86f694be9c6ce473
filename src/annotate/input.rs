//! Pointer input: feeds the tool state machine and drags text labels.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use super::hit_testing::text_at;
use super::machine::{FixedPrompt, ToolStateMachine};
use super::shapes::ShapeStore;
use super::state::{AnnotationSettings, TextDragState};
use crate::canvas::{CameraParams, CanvasBackground, clamp_to_canvas, contains, is_cursor_over_ui};
use crate::remote::GenerationState;
use crate::ui::DialogState;

#[derive(SystemParam)]
pub(crate) struct AnnotationResources<'w> {
    pub mouse_button: Res<'w, ButtonInput<MouseButton>>,
    pub machine: ResMut<'w, ToolStateMachine>,
    pub store: ResMut<'w, ShapeStore>,
    pub drag: ResMut<'w, TextDragState>,
    pub settings: Res<'w, AnnotationSettings>,
    pub background: Res<'w, CanvasBackground>,
    pub generation: Res<'w, GenerationState>,
    pub dialog: Res<'w, DialogState>,
}

pub fn handle_canvas_pointer(
    mut res: AnnotationResources,
    camera: CameraParams,
    mut contexts: EguiContexts,
    mut last_pos: Local<Option<Vec2>>,
) {
    // The canvas is hidden while a generated result is on screen
    if res.generation.result.is_some() || res.dialog.any_modal_open {
        return;
    }

    let cursor = camera.cursor_canvas_pos();

    if res.mouse_button.just_pressed(MouseButton::Left) {
        let Some(raw) = cursor else {
            return;
        };
        if is_cursor_over_ui(&mut contexts) || !contains(raw) {
            return;
        }

        if let Some(id) = text_at(&res.store, raw) {
            res.drag.dragging = Some((id, raw));
            res.machine.cancel_gesture();
            return;
        }

        let AnnotationResources {
            machine,
            store,
            settings,
            background,
            ..
        } = &mut res;
        let style = settings.snapshot();
        let mut prompt = FixedPrompt(&settings.label_text);
        if let Some(id) =
            machine.pointer_down(raw, background.is_loaded(), &style, store, &mut prompt)
        {
            debug!("Committed text label {:?}", id);
        }
        *last_pos = Some(raw);
        return;
    }

    if res.mouse_button.just_released(MouseButton::Left) {
        if res.drag.dragging.take().is_some() {
            return;
        }
        if res.machine.gesture().is_idle() {
            return;
        }
        // A release outside the window ends the gesture where it was last seen
        let Some(pos) = cursor.map(clamp_to_canvas).or(*last_pos) else {
            res.machine.cancel_gesture();
            return;
        };
        let style = res.settings.snapshot();
        let AnnotationResources { machine, store, .. } = &mut res;
        if let Some(id) = machine.pointer_up(pos, &style, store) {
            debug!("Committed shape {:?}", id);
        }
        *last_pos = None;
        return;
    }

    if !res.mouse_button.pressed(MouseButton::Left) {
        return;
    }
    let Some(pos) = cursor.map(clamp_to_canvas) else {
        return;
    };

    if let Some((id, previous)) = res.drag.dragging {
        if pos != previous {
            res.store.move_text(id, pos - previous);
            res.drag.dragging = Some((id, pos));
        }
        return;
    }

    if !res.machine.gesture().is_idle() && *last_pos != Some(pos) {
        res.machine.pointer_move(pos);
        *last_pos = Some(pos);
    }
}
