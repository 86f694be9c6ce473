use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::{egui, EguiContexts};
use futures_lite::future;
use std::path::PathBuf;

use crate::config::{AppConfig, AppConfigData, ConfigResetNotification, SaveConfigRequest};
use crate::constants::{
    MAX_EXPORT_DENSITY, POLL_ATTEMPTS_RANGE, POLL_INTERVAL_RANGE_SECS, REQUEST_TIMEOUT_RANGE_SECS,
};

/// State for the settings dialog
#[derive(Resource, Default)]
pub struct SettingsDialogState {
    /// Whether the dialog is open
    pub is_open: bool,
    /// Copy of the config being edited; `None` until the dialog opens
    pub draft: Option<AppConfigData>,
    /// Font path as string for text editing
    pub font_path: String,
    /// Pending async file dialog for browsing fonts
    pub pending_browse: Option<Task<Option<PathBuf>>>,
}

impl SettingsDialogState {
    /// Initialize the dialog state from current config
    pub fn load_from_config(&mut self, config: &AppConfig) {
        self.font_path = config
            .data
            .font_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        self.draft = Some(config.data.clone());
    }
}

/// Renders the settings dialog
pub fn settings_dialog_ui(
    mut contexts: EguiContexts,
    mut dialog_state: ResMut<SettingsDialogState>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) -> Result {
    // Poll pending browse task (before early return so cleanup happens even if closed)
    if let Some(ref mut task) = dialog_state.pending_browse
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        dialog_state.pending_browse = None;
        if let Some(path) = result {
            dialog_state.font_path = path.to_string_lossy().to_string();
        }
    }

    if !dialog_state.is_open {
        return Ok(());
    }
    if dialog_state.draft.is_none() {
        dialog_state.load_from_config(&config);
    }

    let mut should_close = false;
    let mut should_save = false;
    let mut should_browse = false;

    let SettingsDialogState {
        draft, font_path, ..
    } = &mut *dialog_state;
    let Some(draft) = draft.as_mut() else {
        return Ok(());
    };

    egui::Window::new("Settings")
        .collapsible(false)
        .resizable(true)
        .min_width(420.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.group(|ui| {
                ui.label(egui::RichText::new("Account").strong());
                ui.add_space(8.0);

                ui.checkbox(&mut draft.identity.signed_in, "Signed in");
                ui.horizontal(|ui| {
                    ui.label("User id:");
                    let mut user_id = draft.identity.user_id.clone().unwrap_or_default();
                    if ui.text_edit_singleline(&mut user_id).changed() {
                        draft.identity.user_id = non_empty(user_id);
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Display name:");
                    let mut name = draft.identity.display_name.clone().unwrap_or_default();
                    if ui.text_edit_singleline(&mut name).changed() {
                        draft.identity.display_name = non_empty(name);
                    }
                });
            });

            ui.add_space(12.0);

            ui.group(|ui| {
                ui.label(egui::RichText::new("Generation Backend").strong());
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    ui.label("Base URL:");
                    ui.add(
                        egui::TextEdit::singleline(&mut draft.backend_url).desired_width(280.0),
                    );
                });
                ui.horizontal(|ui| {
                    ui.label("Poll every:");
                    ui.add(
                        egui::DragValue::new(&mut draft.poll_interval_secs)
                            .range(POLL_INTERVAL_RANGE_SECS)
                            .speed(0.1)
                            .suffix(" s"),
                    );
                    ui.label("at most");
                    ui.add(egui::DragValue::new(&mut draft.max_poll_attempts).range(POLL_ATTEMPTS_RANGE));
                    ui.label("times");
                });
                ui.horizontal(|ui| {
                    ui.label("Request timeout:");
                    ui.add(
                        egui::DragValue::new(&mut draft.request_timeout_secs)
                            .range(REQUEST_TIMEOUT_RANGE_SECS)
                            .suffix(" s"),
                    );
                });
            });

            ui.add_space(12.0);

            ui.group(|ui| {
                ui.label(egui::RichText::new("Export").strong());
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    ui.label("Pixel density:");
                    ui.add(
                        egui::DragValue::new(&mut draft.export_density)
                            .range(1..=MAX_EXPORT_DENSITY)
                            .suffix("x"),
                    );
                });
                ui.horizontal(|ui| {
                    ui.label("Label font:");
                    ui.add(
                        egui::TextEdit::singleline(font_path)
                            .desired_width(220.0)
                            .hint_text("Bundled font"),
                    );
                    if ui.button("Browse...").clicked() {
                        should_browse = true;
                    }
                    if ui.button("Clear").clicked() {
                        font_path.clear();
                    }
                });
            });

            ui.add_space(16.0);

            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    should_save = true;
                }

                if ui.button("Cancel").clicked() {
                    should_close = true;
                }
            });
        });

    if should_save {
        draft.font_path = if font_path.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(font_path.trim()))
        };
        if config.data != *draft {
            config.data = draft.clone();
            config.dirty = true;
            save_events.write(SaveConfigRequest);
            info!("Settings updated");
        }
        should_close = true;
    }

    // Handle browse button - spawn async dialog
    if should_browse && dialog_state.pending_browse.is_none() {
        let task_pool = AsyncComputeTaskPool::get();
        dialog_state.pending_browse = Some(task_pool.spawn(async {
            rfd::AsyncFileDialog::new()
                .set_title("Select Label Font")
                .add_filter("Fonts", &["ttf", "otf"])
                .pick_file()
                .await
                .map(|h| h.path().to_path_buf())
        }));
    }

    if should_close {
        dialog_state.is_open = false;
        dialog_state.pending_browse = None;
        dialog_state.draft = None;
    }

    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Tell the user their config file could not be used
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Your settings could not be loaded and were reset to defaults.");
            if let Some(ref reason) = notification.reason {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(reason).weak());
            }
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                notification.show = false;
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty(" user_1 ".to_string()), Some("user_1".to_string()));
    }

    #[test]
    fn test_load_from_config_copies_font_path() {
        let config = AppConfig {
            data: AppConfigData {
                font_path: Some(PathBuf::from("/fonts/a.ttf")),
                ..Default::default()
            },
            config_path: PathBuf::from("config.json"),
            dirty: false,
        };
        let mut state = SettingsDialogState::default();
        state.load_from_config(&config);
        assert_eq!(state.font_path, "/fonts/a.ttf");
        assert_eq!(state.draft, Some(config.data));
    }
}
