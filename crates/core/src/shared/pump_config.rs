use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_HEIGHT, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_SCRATCH_CAPACITY, DEFAULT_TARGET_FPS,
    DEFAULT_WIDTH, INITIAL_BACKOFF, MAX_RECONNECT_ATTEMPTS, PROGRESS_INTERVAL,
    READ_ERROR_THRESHOLD, STOP_GRACE,
};

/// Smallest buffer that can hold an SOI and an EOI marker.
const MIN_SCRATCH_CAPACITY: usize = 4;

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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Path or http(s) URL played when none is given explicitly.
    pub source: Option<String>,
    pub target_fps: u32,
    pub scratch_capacity: usize,
    pub http_timeout_ms: u64,
    pub max_reconnect_attempts: u32,
    pub initial_backoff_ms: u64,
    pub read_error_threshold: u32,
    pub stop_grace_ms: u64,
    pub default_width: u32,
    pub default_height: u32,
    /// Restart raw MJPEG files at EOF. AVI files always loop.
    pub loop_playback: bool,
    pub progress_interval: u64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            source: None,
            target_fps: DEFAULT_TARGET_FPS,
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            initial_backoff_ms: INITIAL_BACKOFF.as_millis() as u64,
            read_error_threshold: READ_ERROR_THRESHOLD,
            stop_grace_ms: STOP_GRACE.as_millis() as u64,
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            loop_playback: false,
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}

impl PumpConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mjpeg-pump").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the per-user config if one exists, defaults otherwise.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::Invalid("target_fps must be at least 1".into()));
        }
        if self.scratch_capacity < MIN_SCRATCH_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "scratch_capacity must be at least {MIN_SCRATCH_CAPACITY} bytes"
            )));
        }
        if self.max_reconnect_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_reconnect_attempts must be at least 1".into(),
            ));
        }
        if self.read_error_threshold == 0 {
            return Err(ConfigError::Invalid(
                "read_error_threshold must be at least 1".into(),
            ));
        }
        if self.default_width == 0 || self.default_height == 0 {
            return Err(ConfigError::Invalid(
                "default dimensions must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Sleep between two scheduler iterations.
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.target_fps.max(1)))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn dump(&self) {
        log::info!("Video pump configuration:");
        log::info!("  source:            {}", self.source.as_deref().unwrap_or("<none>"));
        log::info!("  target fps:        {}", self.target_fps);
        log::info!("  scratch capacity:  {} bytes", self.scratch_capacity);
        log::info!("  http timeout:      {} ms", self.http_timeout_ms);
        log::info!(
            "  reconnect:         {} attempts from {} ms",
            self.max_reconnect_attempts,
            self.initial_backoff_ms
        );
        log::info!("  error threshold:   {}", self.read_error_threshold);
        log::info!(
            "  default size:      {}x{}",
            self.default_width,
            self.default_height
        );
        log::info!("  loop playback:     {}", self.loop_playback);
    }
}
