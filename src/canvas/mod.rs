//! The on-screen canvas: background photo, rendered texture and camera.
//!
//! Canvas space is the fixed 1280x720 annotation space with its origin at the
//! top-left corner and y pointing down. The canvas sprite is centered on the
//! world origin, so world and canvas space differ by a y flip and an offset.

mod camera;

use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use image::RgbaImage;

use crate::annotate::{AnnotationSettings, ShapeStore};
use crate::config::{AppConfig, ConfigLoaded};
use crate::constants::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::export::{LabelFont, Scene, compose, text};

pub use camera::{CameraParams, is_cursor_over_ui};

/// The loaded reference photo. Replaced only by loading another one.
#[derive(Resource, Default)]
pub struct CanvasBackground {
    image: Option<RgbaImage>,
}

impl CanvasBackground {
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn set(&mut self, image: RgbaImage) {
        self.image = Some(image);
    }

    pub fn clear(&mut self) {
        self.image = None;
    }
}

/// Texture the compositor renders the canvas into.
#[derive(Resource)]
pub struct CanvasTexture {
    pub handle: Handle<Image>,
}

#[derive(Component)]
pub struct CanvasSprite;

pub fn canvas_size() -> Vec2 {
    Vec2::new(CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32)
}

pub fn world_to_canvas(world: Vec2) -> Vec2 {
    let half = canvas_size() / 2.0;
    Vec2::new(world.x + half.x, half.y - world.y)
}

pub fn canvas_to_world(canvas: Vec2) -> Vec2 {
    let half = canvas_size() / 2.0;
    Vec2::new(canvas.x - half.x, half.y - canvas.y)
}

pub fn contains(canvas: Vec2) -> bool {
    let size = canvas_size();
    canvas.x >= 0.0 && canvas.y >= 0.0 && canvas.x <= size.x && canvas.y <= size.y
}

pub fn clamp_to_canvas(canvas: Vec2) -> Vec2 {
    canvas.clamp(Vec2::ZERO, canvas_size())
}

/// Convert a decoded image into a bevy texture.
pub fn rgba_to_image(source: &RgbaImage) -> Image {
    Image::new(
        Extent3d {
            width: source.width(),
            height: source.height(),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        source.as_raw().clone(),
        TextureFormat::Rgba8UnormSrgb,
        default(),
    )
}

fn spawn_canvas(mut commands: Commands, mut images: ResMut<Assets<Image>>) {
    let blank = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
    let handle = images.add(rgba_to_image(&blank));
    commands.spawn((
        Sprite {
            image: handle.clone(),
            custom_size: Some(canvas_size()),
            ..default()
        },
        Transform::from_translation(Vec3::ZERO),
        CanvasSprite,
    ));
    commands.insert_resource(CanvasTexture { handle });
}

/// Load the label font named in the config, falling back to the bundled
/// file and then to the font compiled into the binary.
fn load_label_font(config: Res<AppConfig>, mut font: ResMut<LabelFont>) {
    let candidates = text::font_candidates(config.data.font_path.as_deref());
    font.font = text::load_font(&candidates).or_else(|| {
        debug!("No label font in {:?}, using the embedded one", candidates);
        text::embedded_font()
    });
    font.warned_missing = false;
}

/// Re-render the canvas texture when anything it shows has changed.
fn refresh_canvas_texture(
    background: Res<CanvasBackground>,
    store: Res<ShapeStore>,
    settings: Res<AnnotationSettings>,
    mut font: ResMut<LabelFont>,
    texture: Option<Res<CanvasTexture>>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(texture) = texture else {
        return;
    };
    let stale = background.is_changed()
        || store.is_changed()
        || settings.is_changed()
        || font.is_changed()
        || texture.is_added();
    if !stale {
        return;
    }

    font.warn_if_missing(&store);
    let style = settings.snapshot();
    let scene = Scene {
        background: background.image(),
        shapes: &store,
        style: &style,
        font: font.font.as_ref(),
    };
    match compose(&scene, 1) {
        Ok(rendered) => {
            if let Some(image) = images.get_mut(&texture.handle) {
                *image = rgba_to_image(&rendered);
            }
        }
        Err(e) => error!("Failed to render canvas: {}", e),
    }
}

pub struct CanvasPlugin;

impl Plugin for CanvasPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CanvasBackground>()
            .init_resource::<LabelFont>()
            .add_systems(Startup, (camera::spawn_camera, spawn_canvas))
            .add_systems(Startup, load_label_font.after(ConfigLoaded))
            .add_systems(
                Update,
                load_label_font.run_if(resource_changed::<AppConfig>),
            )
            .add_systems(
                Update,
                (
                    camera::camera_pan,
                    camera::camera_zoom,
                    camera::apply_camera_zoom,
                    refresh_canvas_texture,
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_canvas_round_trip_corners() {
        assert_eq!(world_to_canvas(Vec2::new(-640.0, 360.0)), Vec2::ZERO);
        assert_eq!(world_to_canvas(Vec2::new(640.0, -360.0)), Vec2::new(1280.0, 720.0));
        assert_eq!(canvas_to_world(Vec2::new(640.0, 360.0)), Vec2::ZERO);
    }

    #[test]
    fn test_contains_and_clamp() {
        assert!(contains(Vec2::new(0.0, 0.0)));
        assert!(contains(Vec2::new(1280.0, 720.0)));
        assert!(!contains(Vec2::new(-1.0, 10.0)));
        assert!(!contains(Vec2::new(10.0, 721.0)));
        assert_eq!(clamp_to_canvas(Vec2::new(-5.0, 800.0)), Vec2::new(0.0, 720.0));
    }

    #[test]
    fn test_background_set_and_clear() {
        let mut background = CanvasBackground::default();
        assert!(!background.is_loaded());
        background.set(RgbaImage::new(2, 2));
        assert!(background.is_loaded());
        background.clear();
        assert!(background.image().is_none());
    }

    #[test]
    fn test_rgba_to_image_keeps_size() {
        let image = rgba_to_image(&RgbaImage::new(3, 2));
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
    }
}
