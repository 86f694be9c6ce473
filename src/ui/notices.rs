use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::notices::{NoticeLevel, Notices};
use crate::theme;

/// Stack of notices in the bottom-right corner. Persistent ones get a close button.
pub fn notices_ui(mut contexts: EguiContexts, mut notices: ResMut<Notices>) -> Result {
    if notices.is_empty() {
        return Ok(());
    }

    let mut dismissed = Vec::new();

    egui::Area::new(egui::Id::new("notices"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -64.0])
        .interactable(true)
        .show(contexts.ctx_mut()?, |ui| {
            ui.set_max_width(360.0);
            for notice in notices.iter() {
                let fill = match notice.level {
                    NoticeLevel::Info => theme::ui::NOTICE_INFO,
                    NoticeLevel::Error => theme::ui::NOTICE_ERROR,
                };
                egui::Frame::popup(ui.style())
                    .fill(fill)
                    .inner_margin(egui::Margin::symmetric(10, 8))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(
                                egui::RichText::new(&notice.message).color(egui::Color32::WHITE),
                            );
                            if notice.persistent && ui.small_button("x").clicked() {
                                dismissed.push(notice.id);
                            }
                        });
                    });
                ui.add_space(4.0);
            }
        });

    for id in dismissed {
        notices.dismiss(id);
    }
    Ok(())
}
