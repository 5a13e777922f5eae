/// Minimum spacing between decode attempts. Render ticks in between are
/// no-ops as far as decoding is concerned.
pub const DEFAULT_MIN_DECODE_INTERVAL_MS: u64 = 60;

/// How long an overlay survives after its code stops decoding.
pub const DEFAULT_HOLD_DURATION_MS: u64 = 6000;

/// Width the software decoder downsamples every frame to.
pub const DEFAULT_SOFTWARE_TARGET_WIDTH: u32 = 480;

/// Display refresh rate assumed when no compositor callback is available.
pub const DEFAULT_REFRESH_RATE_HZ: u32 = 60;

/// Frame rate used when replaying still images as a feed.
pub const DEFAULT_IMAGE_SEQUENCE_FPS: f64 = 10.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const CONFIG_DIR_NAME: &str = "qr-overlay";
pub const CONFIG_FILE_NAME: &str = "config.json";
