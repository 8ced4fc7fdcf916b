//! # System Constants
//!
//! Fixed values that define the operational boundaries of worker provisioning and the
//! render service contract.

/// Maximum instance creation attempts per worker, fallbacks included
pub const MAX_PROVISION_ATTEMPTS: u32 = 3;

/// Health polls per configured minute of service timeout (5-second granularity)
pub const HEALTH_POLLS_PER_MINUTE: u32 = 12;

/// Hourly rate used when neither the pricing source nor the static table knows a class
pub const DEFAULT_HOURLY_RATE_USD: f64 = 0.10;

/// Decimal places kept on computed costs
pub const COST_DECIMAL_PLACES: i32 = 6;

/// Provider error markers that identify capacity/quota failures
pub const CAPACITY_ERROR_MARKERS: &[&str] = &[
    "VcpuLimitExceeded",
    "InsufficientInstanceCapacity",
    "InstanceLimitExceeded",
    "Unsupported",
];

/// Provider error markers that mean the instance is already gone
pub const NOT_FOUND_ERROR_MARKERS: &[&str] = &["InvalidInstanceID.NotFound", "NotFound"];

/// Render service HTTP contract
pub mod service {
    pub const DEFAULT_PORT: u16 = 5000;
    pub const HEALTH_PATH: &str = "/health";
    pub const RENDER_PATH: &str = "/create_video_onestep";
    pub const DOWNLOAD_PATH: &str = "/download";
    pub const HEALTHY_STATUS: &str = "healthy";
    pub const AUTH_HEADER: &str = "X-Authentication-Key";
    pub const ZOOM_EFFECTS: &[&str] = &["zoom_in", "zoom_out"];
    pub const BACKGROUND_OPACITY: f64 = 0.7;
    pub const ARTIFACT_EXTENSION: &str = "mp4";
}

/// Scene folder layout
pub mod scenes {
    pub const IMAGES_DIR: &str = "images";
    pub const AUDIO_DIR: &str = "audio";
    pub const SCENE_PREFIX: &str = "scene_";
    pub const IMAGE_EXTENSION: &str = "png";
    pub const AUDIO_EXTENSION: &str = "mp3";
    pub const CAPTION_EXTENSION: &str = "srt";
}
