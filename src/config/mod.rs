use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_EXPORT_DENSITY, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL_SECS,
    POLL_ATTEMPTS_RANGE, POLL_INTERVAL_RANGE_SECS, REQUEST_TIMEOUT_RANGE_SECS,
};
use crate::remote::{Identity, PollPolicy};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Application configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfigData {
    /// Base URL of the generation backend
    pub backend_url: String,

    /// Who the user is signed in as
    pub identity: Identity,

    /// Pixel-density multiplier used when exporting for generation
    pub export_density: u32,

    /// TrueType/OpenType font used for text labels (bundled font when unset)
    pub font_path: Option<PathBuf>,

    /// Seconds between two job status queries
    pub poll_interval_secs: f32,

    /// Number of status queries before polling gives up
    pub max_poll_attempts: u32,

    /// Timeout applied to every backend request
    pub request_timeout_secs: u64,
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3210/api".to_string(),
            identity: Identity::default(),
            export_density: DEFAULT_EXPORT_DENSITY,
            font_path: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfigData {
    /// Polling schedule with out-of-range values pulled back to something usable.
    pub fn poll_policy(&self) -> PollPolicy {
        let interval = if self.poll_interval_secs.is_finite() {
            self.poll_interval_secs.clamp(
                *POLL_INTERVAL_RANGE_SECS.start(),
                *POLL_INTERVAL_RANGE_SECS.end(),
            )
        } else {
            DEFAULT_POLL_INTERVAL_SECS
        };
        PollPolicy {
            interval: Duration::from_secs_f32(interval),
            max_attempts: self
                .max_poll_attempts
                .clamp(*POLL_ATTEMPTS_RANGE.start(), *POLL_ATTEMPTS_RANGE.end()),
        }
    }

    /// Request timeout, kept within the range the settings dialog offers.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.clamp(
            *REQUEST_TIMEOUT_RANGE_SECS.start(),
            *REQUEST_TIMEOUT_RANGE_SECS.end(),
        ))
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Read `path`, falling back to defaults with a reason when it is unusable.
fn read_config(path: &std::path::Path) -> (AppConfigData, Option<String>) {
    if !path.exists() {
        info!("No config file found, using defaults");
        return (AppConfigData::default(), None);
    }

    match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(data) => {
                info!("Loaded config from {:?}", path);
                (data, None)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Configuration file was corrupted: {}", e)),
                )
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            (
                AppConfigData::default(),
                Some(format!("Could not read configuration file: {}", e)),
            )
        }
    }
}

fn write_config(config: &AppConfig) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&config.data).map_err(|e| e.to_string())?;
    std::fs::write(&config.config_path, json).map_err(|e| e.to_string())
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let (data, reset_reason) = read_config(&config.config_path);
    config.data = data;
    config.dirty = false;

    if let Some(reason) = reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if !config.dirty {
            continue;
        }
        match write_config(&config) {
            Ok(()) => info!("Config saved to {:?}", config.config_path),
            Err(e) => error!("Failed to save config: {}", e),
        }
        config.dirty = false;
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                save_config_system.run_if(on_message::<SaveConfigRequest>),
            );
    }
}
