//! Configuration management for the SPL monitor
//!
//! Runtime configuration is loaded from a JSON file so calibration location,
//! device selection and server tuning can change without recompilation.
//! Every section has defaults; a missing or invalid file falls back to them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analysis::DEFAULT_SPL_OFFSET;
use crate::calibration::DEFAULT_EXTENSION;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub calibration: CalibrationConfig,
    pub levels: LevelsConfig,
    pub audio: AudioConfig,
    pub server: ServerConfig,
}

/// Where calibration files live and where curves are read
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Directory scanned for calibration files
    pub directory: PathBuf,
    /// Frequency (Hz) at which the curves are interpolated
    pub frequency_hz: f64,
    /// File extension (without dot) of calibration files
    pub extension: String,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("ears"),
            frequency_hz: 1000.0,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// Level conversion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    /// dB added to every dBFS reading before calibration terms
    pub spl_offset_db: f64,
    /// Publish `Direct_*` metrics computed from the capture stream
    pub publish_direct: bool,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            spl_offset_db: DEFAULT_SPL_OFFSET,
            publish_direct: true,
        }
    }
}

/// Capture device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device name; the default input device is used when absent
    pub device_name: String,
    pub sample_rate: u32,
    /// Frames per callback buffer
    pub frames_per_buffer: u32,
    /// Interleaved channels; only stereo is metered
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_name: "E.A.R.S Gain: 18dB".to_string(),
            sample_rate: 48_000,
            frames_per_buffer: 2048,
            channels: 2,
        }
    }
}

/// HTTP / WebSocket server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Upper bound on a single WebSocket write
    pub write_timeout_ms: u64,
    /// Pending messages per subscriber before it is dropped
    pub subscriber_queue: usize,
    /// Period of the status log lines
    pub status_interval_ms: u64,
}

impl ServerConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            write_timeout_ms: 1000,
            subscriber_queue: 64,
            status_interval_ms: 1000,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or
    /// invalid. Sections and fields absent from the file keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load `assets/spl_config.json` relative to the working directory
    pub fn load() -> Self {
        Self::load_from_file("assets/spl_config.json")
    }
}
