use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_HOLD_DURATION_MS, DEFAULT_MIN_DECODE_INTERVAL_MS,
    DEFAULT_REFRESH_RATE_HZ, DEFAULT_SOFTWARE_TARGET_WIDTH,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which polarities the software decoder tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InversionMode {
    /// Dark modules on a light background only.
    DontInvert,
    /// Retry with inverted luma after a normal-polarity miss.
    AttemptBoth,
}

impl std::fmt::Display for InversionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InversionMode::DontInvert => write!(f, "dont_invert"),
            InversionMode::AttemptBoth => write!(f, "attempt_both"),
        }
    }
}

/// Tuning for a scan session. Every field falls back to its default when
/// missing from the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub min_decode_interval_ms: u64,
    pub hold_duration_ms: u64,
    pub software_target_width: u32,
    pub inversion: InversionMode,
    pub refresh_rate_hz: u32,
    pub background_decode: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_decode_interval_ms: DEFAULT_MIN_DECODE_INTERVAL_MS,
            hold_duration_ms: DEFAULT_HOLD_DURATION_MS,
            software_target_width: DEFAULT_SOFTWARE_TARGET_WIDTH,
            inversion: InversionMode::DontInvert,
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            background_decode: true,
        }
    }
}

impl ScanConfig {
    pub fn min_decode_interval(&self) -> Duration {
        Duration::from_millis(self.min_decode_interval_ms)
    }

    pub fn hold_duration(&self) -> Duration {
        Duration::from_millis(self.hold_duration_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_rate_hz.max(1) as f64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.software_target_width == 0 {
            return Err(ConfigError::Invalid(
                "software_target_width must be at least 1".into(),
            ));
        }
        if self.refresh_rate_hz == 0 {
            return Err(ConfigError::Invalid(
                "refresh_rate_hz must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// `<platform config dir>/qr-overlay/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScanConfig =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at [`ScanConfig::default_path`] if one exists.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}
