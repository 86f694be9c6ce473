use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::annotate::{AnnotationSettings, AnnotationTool, ToolStateMachine};
use crate::constants::{FONT_SIZE_RANGE, STROKE_WIDTH_RANGE};
use crate::remote::Account;
use crate::theme;

use super::settings_dialog::SettingsDialogState;

/// Main toolbar showing tools, the account and the settings button
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    mut machine: ResMut<ToolStateMachine>,
    account: Res<Account>,
    mut settings_dialog: ResMut<SettingsDialogState>,
) -> Result {
    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                for tool in AnnotationTool::all() {
                    let selected = machine.tool() == *tool;

                    let button = egui::Button::new(
                        egui::RichText::new(tool_button_label(tool)).size(14.0).strong(),
                    )
                    .min_size(egui::vec2(0.0, 28.0))
                    .selected(selected);

                    let response = ui.add(button);
                    if response.clicked() && !selected && machine.set_tool(*tool) {
                        debug!("Tool switch discarded the gesture in progress");
                    }
                    response.on_hover_text(tool.display_name());
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add(egui::Button::new("Settings").min_size(egui::vec2(0.0, 24.0)))
                        .clicked()
                    {
                        settings_dialog.is_open = true;
                    }

                    ui.add_space(8.0);
                    account_label(ui, &account);
                });
            });
        });
    Ok(())
}

fn account_label(ui: &mut egui::Ui, account: &Account) {
    let Some(owner) = account.owner() else {
        ui.label(egui::RichText::new("Not signed in").color(theme::ui::HINT_TEXT));
        return;
    };

    match account.credits {
        Some(credits) => {
            let color = if credits > 0 {
                theme::ui::CREDITS_OK
            } else {
                theme::ui::ERROR_TEXT
            };
            ui.colored_label(color, egui::RichText::new(format!("{} credits", credits)).strong());
        }
        None => {
            ui.label(egui::RichText::new("Credits unknown").color(theme::ui::HINT_TEXT));
        }
    }

    let name = account.identity.display_name.as_deref().unwrap_or(owner);
    ui.label(egui::RichText::new(name).color(theme::ui::LABEL_TEXT));
}

/// Secondary toolbar showing settings for the active tool
pub fn tool_settings_ui(
    mut contexts: EguiContexts,
    machine: Res<ToolStateMachine>,
    mut settings: ResMut<AnnotationSettings>,
) -> Result {
    let tool = machine.tool();
    let mut changed = false;

    egui::TopBottomPanel::top("tool_settings")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 6))
                .fill(theme::ui::PANEL_BACKGROUND),
        )
        .show(contexts.ctx_mut()?, |ui| {
            // Edited in place every frame; only real edits should re-render the canvas
            let settings = settings.bypass_change_detection();

            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 6.0;

                ui.label(
                    egui::RichText::new(format!("{} Settings:", tool_name(tool)))
                        .color(theme::ui::LABEL_TEXT),
                );
                ui.add_space(8.0);

                match tool {
                    AnnotationTool::Rect => {
                        ui.label("Fill:");
                        if let Some(color) = color_swatches(ui, settings.fill_color) {
                            settings.fill_color = color;
                            changed = true;
                        }
                    }
                    AnnotationTool::Draw | AnnotationTool::Arrow | AnnotationTool::Text => {
                        ui.label("Color:");
                        if let Some(color) = color_swatches(ui, settings.stroke_color) {
                            settings.stroke_color = color;
                            changed = true;
                        }
                    }
                }

                ui.add_space(12.0);
                ui.separator();
                ui.add_space(12.0);

                match tool {
                    AnnotationTool::Draw | AnnotationTool::Arrow => {
                        ui.label("Width:");
                        changed |= ui
                            .add(
                                egui::DragValue::new(&mut settings.stroke_width)
                                    .range(STROKE_WIDTH_RANGE)
                                    .speed(0.5)
                                    .suffix(" px"),
                            )
                            .changed();
                    }
                    AnnotationTool::Text => {
                        ui.label("Font Size:");
                        changed |= ui
                            .add(
                                egui::DragValue::new(&mut settings.font_size)
                                    .range(FONT_SIZE_RANGE)
                                    .speed(1.0)
                                    .suffix(" px"),
                            )
                            .changed();
                        ui.add_space(8.0);
                        ui.label("Label:");
                        // The label only matters for the next click, no re-render needed
                        ui.add(
                            egui::TextEdit::singleline(&mut settings.label_text)
                                .desired_width(200.0)
                                .hint_text("Text placed on click"),
                        );
                    }
                    AnnotationTool::Rect => {
                        ui.label(
                            egui::RichText::new("Drag to cover an area at half opacity")
                                .color(theme::ui::HINT_TEXT)
                                .size(11.0),
                        );
                    }
                }

                ui.add_space(12.0);
                ui.label(
                    egui::RichText::new("Esc: discard gesture")
                        .color(theme::ui::HINT_TEXT)
                        .size(11.0),
                );
            });
        });

    if changed {
        settings.set_changed();
    }
    Ok(())
}

/// Palette buttons. Returns the clicked color, if any.
fn color_swatches(ui: &mut egui::Ui, current: Color) -> Option<Color> {
    let mut picked = None;
    for (color, name, egui_color) in theme::annotation_colors() {
        let is_selected = theme::same_rgb(current, color);

        let button = egui::Button::new("")
            .fill(egui_color)
            .min_size(egui::vec2(18.0, 18.0))
            .stroke(if is_selected {
                egui::Stroke::new(2.0, theme::ui::SELECTED_BORDER)
            } else {
                egui::Stroke::new(1.0, theme::ui::UNSELECTED_BORDER)
            });

        let response = ui.add(button);
        if response.clicked() {
            picked = Some(color);
        }
        response.on_hover_text(name);
    }

    // Any other color through the egui picker
    let mut custom = theme::bevy_to_egui_opaque(current);
    if ui.color_edit_button_srgba(&mut custom).changed() {
        picked = Some(theme::egui_to_bevy(custom));
    }
    picked
}

fn tool_name(tool: AnnotationTool) -> &'static str {
    match tool {
        AnnotationTool::Draw => "Draw",
        AnnotationTool::Text => "Text",
        AnnotationTool::Arrow => "Arrow",
        AnnotationTool::Rect => "Shape",
    }
}

/// Get the button label for a tool (with keyboard shortcut)
fn tool_button_label(tool: &AnnotationTool) -> &'static str {
    match tool {
        AnnotationTool::Draw => "Draw [D]",
        AnnotationTool::Text => "Text [T]",
        AnnotationTool::Arrow => "Arrow [A]",
        AnnotationTool::Rect => "Shape [R]",
    }
}
