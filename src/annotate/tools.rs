use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow, SystemCursorIcon};
use bevy_egui::EguiContexts;

use super::machine::ToolStateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationTool {
    #[default]
    Draw,
    Text,
    Arrow,
    Rect,
}

impl AnnotationTool {
    pub fn display_name(&self) -> &'static str {
        match self {
            AnnotationTool::Draw => "Draw (D)",
            AnnotationTool::Text => "Text (T)",
            AnnotationTool::Arrow => "Arrow (A)",
            AnnotationTool::Rect => "Shape (R)",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            AnnotationTool::Draw => CursorIcon::System(SystemCursorIcon::Crosshair),
            AnnotationTool::Text => CursorIcon::System(SystemCursorIcon::Text),
            AnnotationTool::Arrow => CursorIcon::System(SystemCursorIcon::Crosshair),
            AnnotationTool::Rect => CursorIcon::System(SystemCursorIcon::Crosshair),
        }
    }

    pub fn all() -> &'static [AnnotationTool] {
        &[
            AnnotationTool::Draw,
            AnnotationTool::Text,
            AnnotationTool::Arrow,
            AnnotationTool::Rect,
        ]
    }
}

pub fn handle_tool_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut machine: ResMut<ToolStateMachine>,
    mut contexts: EguiContexts,
) {
    // Don't change tools if typing in a text field
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.wants_keyboard_input()
    {
        return;
    }

    if keyboard.just_pressed(KeyCode::Escape) && machine.cancel_gesture() {
        debug!("Discarded in-progress gesture");
        return;
    }

    let new_tool = if keyboard.just_pressed(KeyCode::KeyD) {
        Some(AnnotationTool::Draw)
    } else if keyboard.just_pressed(KeyCode::KeyT) {
        Some(AnnotationTool::Text)
    } else if keyboard.just_pressed(KeyCode::KeyA) {
        Some(AnnotationTool::Arrow)
    } else if keyboard.just_pressed(KeyCode::KeyR) {
        Some(AnnotationTool::Rect)
    } else {
        None
    };

    if let Some(tool) = new_tool
        && tool != machine.tool()
    {
        machine.set_tool(tool);
    }
}

pub fn update_cursor_icon(
    machine: Res<ToolStateMachine>,
    window_query: Query<Entity, With<PrimaryWindow>>,
    mut commands: Commands,
    mut contexts: EguiContexts,
) {
    let Ok(entity) = window_query.single() else {
        return;
    };

    // Use default cursor over UI, tool cursor over the canvas
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.is_pointer_over_area()
    {
        commands
            .entity(entity)
            .insert(CursorIcon::System(SystemCursorIcon::Default));
        return;
    }

    commands.entity(entity).insert(machine.tool().cursor_icon());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_contain_shortcuts() {
        for tool in AnnotationTool::all() {
            let name = tool.display_name();
            assert!(name.contains('('), "Display name should contain shortcut: {}", name);
            assert!(name.contains(')'), "Display name should contain shortcut: {}", name);
        }
    }

    #[test]
    fn test_all_returns_all_tools() {
        let all = AnnotationTool::all();
        assert_eq!(all.len(), 4);
        assert!(all.contains(&AnnotationTool::Draw));
        assert!(all.contains(&AnnotationTool::Text));
        assert!(all.contains(&AnnotationTool::Arrow));
        assert!(all.contains(&AnnotationTool::Rect));
    }

    #[test]
    fn test_default_tool_is_draw() {
        assert_eq!(AnnotationTool::default(), AnnotationTool::Draw);
    }

    #[test]
    fn test_text_tool_has_text_cursor() {
        assert_eq!(
            AnnotationTool::Text.cursor_icon(),
            CursorIcon::System(SystemCursorIcon::Text)
        );
    }

    #[test]
    fn test_shape_tools_have_crosshair() {
        for tool in [AnnotationTool::Draw, AnnotationTool::Arrow, AnnotationTool::Rect] {
            assert_eq!(
                tool.cursor_icon(),
                CursorIcon::System(SystemCursorIcon::Crosshair)
            );
        }
    }
}
