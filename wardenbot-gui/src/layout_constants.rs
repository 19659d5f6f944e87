// Layout constants for consistent spacing across the dashboard

pub const WINDOW_WIDTH: f32 = 520.0;
pub const WINDOW_HEIGHT: f32 = 640.0;
pub const MIN_WINDOW_WIDTH: f32 = 420.0;
pub const MIN_WINDOW_HEIGHT: f32 = 480.0;

pub const SECTION_SPACING: f32 = 10.0; // Gap between grouped sections
pub const ACTION_BUTTON_WIDTH: f32 = 110.0;
pub const ACTION_BUTTON_HEIGHT: f32 = 32.0;
pub const STATUS_DOT_RADIUS: f32 = 6.0;

// Status is written by the worker thread, so keep polling even without input
pub const STATUS_POLL_MS: u64 = 500;
