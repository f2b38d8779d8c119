//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory where per-project clip directories live.
    pub output_root: PathBuf,

    /// Default recording settings.
    pub recording: RecordingDefaults,

    /// Pre-initialization behavior.
    pub pre_init: PreInitConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default recording parameters applied when building a capture config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingDefaults {
    /// Default frames per second.
    pub fps: u32,

    /// Quality hint in `[0, 100]`; scales the encoder bitrate.
    pub quality: u32,

    /// Whether the cursor is included in the capture.
    pub capture_cursor: bool,

    /// Whether microphone audio is recorded by default.
    pub capture_microphone: bool,
}

/// Pre-initialization manager behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreInitConfig {
    /// Seconds of user inactivity before the warm capture session is torn
    /// down to release OS resources.
    pub idle_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "pushclip=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            recording: RecordingDefaults::default(),
            pre_init: PreInitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RecordingDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            quality: 100,
            capture_cursor: true,
            capture_microphone: false,
        }
    }
}

impl Default for PreInitConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 180,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("pushclip")
        .join("config.json")
}

/// Platform-default clip root: the user's videos directory under a
/// `PushToHold` subdirectory.
fn default_output_root() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("PushToHold")
}
