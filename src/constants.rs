//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Fixed width of the annotation canvas in canvas units
pub const CANVAS_WIDTH: u32 = 1280;

/// Fixed height of the annotation canvas in canvas units
pub const CANVAS_HEIGHT: u32 = 720;

/// Pixel-density multiplier used when exporting the composition
pub const DEFAULT_EXPORT_DENSITY: u32 = 2;

/// Largest density multiplier accepted by the exporter
pub const MAX_EXPORT_DENSITY: u32 = 8;

/// Length of an arrow head along the shaft, in canvas units
pub const ARROW_POINTER_LENGTH: f32 = 10.0;

/// Width of an arrow head across the shaft, in canvas units
pub const ARROW_POINTER_WIDTH: f32 = 10.0;

/// Opacity applied to rectangle fills
pub const RECT_FILL_OPACITY: f32 = 0.5;

/// Stroke width range offered by the toolbar
pub const STROKE_WIDTH_RANGE: std::ops::RangeInclusive<f32> = 1.0..=20.0;

/// Font size range offered by the toolbar
pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<f32> = 12.0..=72.0;

/// Text offered as the starting value of the label prompt
pub const DEFAULT_LABEL_TEXT: &str = "Your text here";

/// Content type of exported compositions
pub const EXPORT_CONTENT_TYPE: &str = "image/png";

/// Seconds a transient notice stays on screen
pub const NOTICE_LIFETIME_SECS: f32 = 5.0;

/// Default delay between two job status queries
pub const DEFAULT_POLL_INTERVAL_SECS: f32 = 3.0;

/// Default number of status queries before polling gives up
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 200;

/// Accepted delay between two job status queries, in seconds
pub const POLL_INTERVAL_RANGE_SECS: std::ops::RangeInclusive<f32> = 0.5..=60.0;

/// Accepted number of status queries per job
pub const POLL_ATTEMPTS_RANGE: std::ops::RangeInclusive<u32> = 1..=10_000;

/// Accepted network request timeout, in seconds
pub const REQUEST_TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=600;

/// File name suggested when saving a generated thumbnail
pub const RESULT_FILE_NAME: &str = "thumbnail.png";
