//! Bottom action bar: upload, cancel, generate and clear.

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::{egui, EguiContexts};
use futures_lite::future;
use std::path::PathBuf;

use crate::annotate::{ShapeStore, ToolStateMachine};
use crate::canvas::CanvasBackground;
use crate::remote::{GenerateRequested, GenerationState, ReferencePicked, ResetKind, ResetSession};
use crate::theme;

/// Pending async file dialog for the reference photo
#[derive(Resource, Default)]
pub struct ReferencePickerState {
    pub pending: Option<Task<Option<(PathBuf, Vec<u8>)>>>,
}

fn spawn_reference_picker() -> Task<Option<(PathBuf, Vec<u8>)>> {
    AsyncComputeTaskPool::get().spawn(async {
        let handle = rfd::AsyncFileDialog::new()
            .set_title("Choose a Reference Photo")
            .add_filter("Images", &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tiff"])
            .pick_file()
            .await?;
        let bytes = handle.read().await;
        Some((handle.path().to_path_buf(), bytes))
    })
}

/// Forward a picked file to the generation systems.
pub fn poll_reference_picker(
    mut picker: ResMut<ReferencePickerState>,
    mut picked: MessageWriter<ReferencePicked>,
) {
    let Some(task) = picker.pending.as_mut() else {
        return;
    };
    let Some(result) = future::block_on(future::poll_once(task)) else {
        return;
    };
    picker.pending = None;

    match result {
        Some((path, bytes)) if bytes.is_empty() => {
            warn!("Picked file {:?} is empty", path);
        }
        Some((path, bytes)) => {
            picked.write(ReferencePicked { path, bytes });
        }
        None => debug!("Reference picker dismissed"),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn action_bar_ui(
    mut contexts: EguiContexts,
    mut picker: ResMut<ReferencePickerState>,
    background: Res<CanvasBackground>,
    state: Res<GenerationState>,
    mut store: ResMut<ShapeStore>,
    mut machine: ResMut<ToolStateMachine>,
    mut generate: MessageWriter<GenerateRequested>,
    mut reset: MessageWriter<ResetSession>,
) -> Result {
    // The result view has its own buttons
    if state.result.is_some() {
        return Ok(());
    }

    let has_session = background.is_loaded() || state.reference.is_some() || state.job.is_some();
    let ctx = contexts.ctx_mut()?;

    egui::TopBottomPanel::bottom("action_bar")
        .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(12, 8)))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let upload = ui.add_enabled(
                    picker.pending.is_none() && !state.processing,
                    egui::Button::new("Upload Photo").min_size(egui::vec2(0.0, 28.0)),
                );
                if upload.clicked() {
                    picker.pending = Some(spawn_reference_picker());
                }

                if ui
                    .add_enabled(has_session, egui::Button::new("Cancel"))
                    .clicked()
                {
                    reset.write(ResetSession(ResetKind::Cancel));
                }

                let can_clear = !store.is_empty() || !machine.gesture().is_idle();
                if ui
                    .add_enabled(can_clear, egui::Button::new("Clear Annotations"))
                    .clicked()
                {
                    store.clear();
                    machine.cancel_gesture();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let generate_button = egui::Button::new(
                        egui::RichText::new("Generate Thumbnail").strong(),
                    )
                    .min_size(egui::vec2(0.0, 28.0));
                    if ui
                        .add_enabled(background.is_loaded() && !state.processing, generate_button)
                        .clicked()
                    {
                        generate.write(GenerateRequested);
                    }

                    if state.processing {
                        ui.spinner();
                        let status = match &state.poller {
                            Some(poller) => format!("Generating (check {})", poller.attempts()),
                            None => "Uploading".to_string(),
                        };
                        ui.label(egui::RichText::new(status).color(theme::ui::HINT_TEXT));
                    } else if !background.is_loaded() {
                        ui.label(
                            egui::RichText::new("Upload a photo to start annotating")
                                .color(theme::ui::HINT_TEXT),
                        );
                    }
                });
            });
        });
    Ok(())
}
