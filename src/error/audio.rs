// Audio capture error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 1001-1006
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Requested input device not present
    pub const DEVICE_NOT_FOUND: i32 = 1001;

    /// Failed to open audio stream
    pub const STREAM_OPEN_FAILED: i32 = 1002;

    /// Hardware error occurred
    pub const HARDWARE_ERROR: i32 = 1003;

    /// Stream or file format is not two-channel float audio
    pub const UNSUPPORTED_FORMAT: i32 = 1004;

    /// Audio file could not be read
    pub const FILE_READ_FAILED: i32 = 1005;

    /// Binary built without the `capture` feature
    pub const CAPTURE_UNAVAILABLE: i32 = 1006;
}

/// Log an audio error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioCapture, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover device lookup, stream management, and offline file
/// replay.
///
/// Error code ranges: 1001-1006
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Requested input device not present
    DeviceNotFound { name: String },

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Hardware error occurred
    HardwareError { details: String },

    /// Only interleaved stereo is measured
    UnsupportedFormat { details: String },

    /// Audio file could not be read
    FileReadFailed { path: String, reason: String },

    /// Live capture was compiled out
    CaptureUnavailable,
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::DeviceNotFound { .. } => AudioErrorCodes::DEVICE_NOT_FOUND,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::FileReadFailed { .. } => AudioErrorCodes::FILE_READ_FAILED,
            AudioError::CaptureUnavailable => AudioErrorCodes::CAPTURE_UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::DeviceNotFound { name } => {
                format!("Input device '{}' not found", name)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::UnsupportedFormat { details } => {
                format!("Unsupported audio format: {}", details)
            }
            AudioError::FileReadFailed { path, reason } => {
                format!("Failed to read audio file {}: {}", path, reason)
            }
            AudioError::CaptureUnavailable => {
                "Live capture unavailable: rebuild with --features capture".to_string()
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}
