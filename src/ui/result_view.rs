//! Result view shown in place of the canvas once a thumbnail is generated.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiTextureHandle, EguiUserTextures};

use crate::canvas::CanvasSprite;
use crate::constants::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::remote::{DownloadResult, GenerationState, ResetKind, ResetSession};
use crate::theme;

/// egui texture registered for the current result image
#[derive(Resource, Default)]
pub struct ResultTexture {
    registered: Option<(AssetId<Image>, egui::TextureId)>,
}

/// Register the downloaded result image with egui once it arrives.
pub fn register_result_texture(
    state: Res<GenerationState>,
    mut texture: ResMut<ResultTexture>,
    mut egui_textures: ResMut<EguiUserTextures>,
) {
    let handle = state.result.as_ref().and_then(|r| r.image.as_ref());
    let Some(handle) = handle else {
        if texture.registered.is_some() {
            texture.registered = None;
        }
        return;
    };

    let id = handle.id();
    if texture.registered.map(|(registered, _)| registered) == Some(id) {
        return;
    }
    let texture_id = egui_textures.add_image(EguiTextureHandle::Weak(id));
    texture.registered = Some((id, texture_id));
}

/// Hide the canvas sprite while the result view covers it.
pub fn sync_canvas_visibility(
    state: Res<GenerationState>,
    mut sprites: Query<&mut Visibility, With<CanvasSprite>>,
) {
    let wanted = if state.result.is_some() {
        Visibility::Hidden
    } else {
        Visibility::Inherited
    };
    for mut visibility in sprites.iter_mut() {
        if *visibility != wanted {
            *visibility = wanted;
        }
    }
}

pub fn result_view_ui(
    mut contexts: EguiContexts,
    state: Res<GenerationState>,
    texture: Res<ResultTexture>,
    mut download: MessageWriter<DownloadResult>,
    mut reset: MessageWriter<ResetSession>,
) -> Result {
    let Some(result) = state.result.as_ref() else {
        return Ok(());
    };

    egui::CentralPanel::default().show(contexts.ctx_mut()?, |ui| {
        ui.vertical_centered(|ui| {
            ui.heading("Your thumbnail is ready");
            ui.add_space(12.0);

            let available = ui.available_width().min(CANVAS_WIDTH as f32);
            let size = egui::vec2(
                available,
                available * CANVAS_HEIGHT as f32 / CANVAS_WIDTH as f32,
            );
            match texture.registered {
                Some((_, texture_id)) => {
                    ui.add(
                        egui::Image::new(egui::load::SizedTexture::new(texture_id, size))
                            .fit_to_exact_size(size)
                            .corner_radius(4.0),
                    );
                }
                None if result.fetch_failed => {
                    ui.label(
                        egui::RichText::new("The preview could not be loaded.")
                            .color(theme::ui::ERROR_TEXT),
                    );
                }
                None => {
                    ui.spinner();
                }
            }

            ui.add_space(8.0);
            ui.label(egui::RichText::new(&result.url).weak().small());
            ui.add_space(12.0);

            ui.horizontal(|ui| {
                if ui.button("Open in Browser").clicked()
                    && let Err(e) = open::that(&result.url)
                {
                    error!("Failed to open {}: {}", result.url, e);
                }

                if ui.button("Download").clicked() {
                    download.write(DownloadResult);
                }

                if ui.button("Create New").clicked() {
                    reset.write(ResetSession(ResetKind::CreateNew));
                }
            });
        });
    });
    Ok(())
}
