//! Centralized color theme for the application.
//!
//! Colors used by the canvas overlays and the egui panels live here.

use bevy::prelude::Color;
use bevy_egui::egui;

// ============================================================================
// Canvas Colors
// ============================================================================

/// Outline of the export area
pub const CANVAS_FRAME: Color = Color::srgba(0.6, 0.6, 0.6, 0.8);

/// Alpha applied to arrow previews while the arrow is being placed
pub const PREVIEW_ALPHA: f32 = 0.7;

/// Color palette offered by the toolbar pickers
pub fn annotation_colors() -> [(Color, &'static str, egui::Color32); 8] {
    [
        (Color::srgb(1.0, 0.0, 0.0), "Red", egui::Color32::RED),
        (
            Color::srgb(1.0, 0.8, 0.0),
            "Amber",
            egui::Color32::from_rgb(255, 204, 0),
        ),
        (Color::srgb(0.0, 0.0, 1.0), "Blue", egui::Color32::BLUE),
        (
            Color::srgb(0.0, 0.8, 0.0),
            "Green",
            egui::Color32::from_rgb(0, 200, 0),
        ),
        (Color::srgb(0.0, 0.0, 0.0), "Black", egui::Color32::BLACK),
        (Color::srgb(1.0, 1.0, 1.0), "White", egui::Color32::WHITE),
        (
            Color::srgb(1.0, 0.5, 0.0),
            "Orange",
            egui::Color32::from_rgb(255, 128, 0),
        ),
        (
            Color::srgb(0.5, 0.0, 0.5),
            "Purple",
            egui::Color32::from_rgb(128, 0, 128),
        ),
    ]
}

// ============================================================================
// UI Colors (egui)
// ============================================================================

pub mod ui {
    use bevy_egui::egui;

    /// Dark grey panel background (tool settings bar)
    pub const PANEL_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(45, 45, 48);

    /// Light grey for label text
    pub const LABEL_TEXT: egui::Color32 = egui::Color32::LIGHT_GRAY;

    /// Grey for help/hint text
    pub const HINT_TEXT: egui::Color32 = egui::Color32::GRAY;

    /// White for selected swatch borders
    pub const SELECTED_BORDER: egui::Color32 = egui::Color32::WHITE;

    /// Dark grey for unselected swatch borders
    pub const UNSELECTED_BORDER: egui::Color32 = egui::Color32::DARK_GRAY;

    /// Background of informational notices
    pub const NOTICE_INFO: egui::Color32 = egui::Color32::from_rgb(40, 70, 110);

    /// Background of error notices
    pub const NOTICE_ERROR: egui::Color32 = egui::Color32::from_rgb(130, 40, 40);

    /// Green credit balance
    pub const CREDITS_OK: egui::Color32 = egui::Color32::from_rgb(100, 200, 100);

    /// Red for error messages and an empty credit balance
    pub const ERROR_TEXT: egui::Color32 = egui::Color32::RED;
}

// ============================================================================
// Color Conversion Utilities
// ============================================================================

/// Convert a Bevy Color to egui Color32 (fully opaque)
pub fn bevy_to_egui_opaque(color: Color) -> egui::Color32 {
    let srgba = color.to_srgba();
    egui::Color32::from_rgba_unmultiplied(
        (srgba.red * 255.0) as u8,
        (srgba.green * 255.0) as u8,
        (srgba.blue * 255.0) as u8,
        255,
    )
}

/// Convert an egui Color32 to Bevy Color
pub fn egui_to_bevy(color: egui::Color32) -> Color {
    Color::srgba(
        color.r() as f32 / 255.0,
        color.g() as f32 / 255.0,
        color.b() as f32 / 255.0,
        color.a() as f32 / 255.0,
    )
}

/// Whether two colors match in their RGB channels
pub fn same_rgb(a: Color, b: Color) -> bool {
    let a = a.to_srgba();
    let b = b.to_srgba();
    (a.red - b.red).abs() < 0.01
        && (a.green - b.green).abs() < 0.01
        && (a.blue - b.blue).abs() < 0.01
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_contains_default_colors() {
        let palette = annotation_colors();
        let red = Color::srgb_u8(0xff, 0x00, 0x00);
        let amber = Color::srgb_u8(0xff, 0xcc, 0x00);
        assert!(palette.iter().any(|(c, _, _)| same_rgb(*c, red)));
        assert!(palette.iter().any(|(c, _, _)| same_rgb(*c, amber)));
    }

    #[test]
    fn test_egui_round_trip() {
        let color = egui::Color32::from_rgb(255, 0, 255);
        assert_eq!(bevy_to_egui_opaque(egui_to_bevy(color)), color);
    }
}
