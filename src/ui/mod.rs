mod actions;
mod notices;
mod result_view;
mod settings_dialog;
mod toolbar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::ConfigResetNotification;

/// Resource that tracks whether any modal dialog is currently open.
/// Canvas input handlers check this to avoid drawing while the user is
/// interacting with a dialog.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block canvas input
    pub any_modal_open: bool,
}

/// System to aggregate all dialog open states into a single resource.
/// Runs in First schedule before input handlers.
fn update_dialog_state(
    settings: Res<settings_dialog::SettingsDialogState>,
    config_reset: Res<ConfigResetNotification>,
    picker: Res<actions::ReferencePickerState>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open =
        settings.is_open || config_reset.show || picker.pending.is_some();
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            .init_resource::<crate::notices::Notices>()
            .init_resource::<settings_dialog::SettingsDialogState>()
            .init_resource::<actions::ReferencePickerState>()
            .init_resource::<result_view::ResultTexture>()
            .add_systems(First, update_dialog_state)
            .add_systems(
                Update,
                (
                    actions::poll_reference_picker,
                    result_view::register_result_texture,
                    result_view::sync_canvas_visibility,
                    crate::notices::expire_notices,
                ),
            )
            // Top panels first, then the bottom action bar, then floating windows
            .add_systems(
                EguiPrimaryContextPass,
                (
                    toolbar::toolbar_ui,
                    toolbar::tool_settings_ui,
                    actions::action_bar_ui,
                    result_view::result_view_ui,
                    notices::notices_ui,
                    settings_dialog::settings_dialog_ui,
                    settings_dialog::config_reset_notification_ui,
                )
                    .chain(),
            );
    }
}
