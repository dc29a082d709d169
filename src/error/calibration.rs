// Calibration error types and constants

use crate::calibration::Channel;
use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Single source of truth for the numeric codes reported by the CLI and
/// HTTP surfaces.
///
/// Error code range: 2001-2009
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// Calibration directory missing or unreadable
    pub const DIRECTORY_UNREADABLE: i32 = 2001;

    /// Calibration file could not be read
    pub const FILE_UNREADABLE: i32 = 2002;

    /// Data row does not have exactly three fields
    pub const MALFORMED_ROW: i32 = 2003;

    /// Data row field is not a number
    pub const INVALID_NUMBER: i32 = 2004;

    /// `Sens Factor` declaration could not be parsed
    pub const INVALID_SENSITIVITY: i32 = 2005;

    /// File metadata never names a channel
    pub const CHANNEL_NOT_FOUND: i32 = 2006;

    /// File contains no data rows
    pub const EMPTY_FILE: i32 = 2007;

    /// Data row frequency is lower than the previous row
    pub const NON_ASCENDING: i32 = 2008;

    /// No file in the directory provided data for a channel
    pub const MISSING_CHANNEL: i32 = 2009;
}

/// Log a calibration error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=CalibrationStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration loading errors
///
/// Every variant is fatal: the store is never handed out with partial data.
///
/// Error code ranges: 2001-2009
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Calibration directory missing or unreadable
    DirectoryUnreadable { path: String, reason: String },

    /// Calibration file could not be read
    FileUnreadable { file: String, reason: String },

    /// Data row does not have exactly three whitespace-separated fields
    MalformedRow {
        file: String,
        line: usize,
        content: String,
    },

    /// Data row field is not a floating point number
    InvalidNumber {
        file: String,
        line: usize,
        field: &'static str,
        value: String,
    },

    /// `Sens Factor = <number>dB` declaration could not be parsed
    InvalidSensitivity {
        file: String,
        line: usize,
        content: String,
    },

    /// Metadata lines never mention LEFT or RIGHT
    ChannelNotFound { file: String },

    /// File yielded zero data rows
    EmptyFile { file: String },

    /// Data row frequency went backwards
    NonAscending {
        file: String,
        line: usize,
        frequency: f64,
        previous: f64,
    },

    /// No calibration data found for a channel after scanning the directory
    MissingChannel { channel: Channel },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::DirectoryUnreadable { .. } => {
                CalibrationErrorCodes::DIRECTORY_UNREADABLE
            }
            CalibrationError::FileUnreadable { .. } => CalibrationErrorCodes::FILE_UNREADABLE,
            CalibrationError::MalformedRow { .. } => CalibrationErrorCodes::MALFORMED_ROW,
            CalibrationError::InvalidNumber { .. } => CalibrationErrorCodes::INVALID_NUMBER,
            CalibrationError::InvalidSensitivity { .. } => {
                CalibrationErrorCodes::INVALID_SENSITIVITY
            }
            CalibrationError::ChannelNotFound { .. } => CalibrationErrorCodes::CHANNEL_NOT_FOUND,
            CalibrationError::EmptyFile { .. } => CalibrationErrorCodes::EMPTY_FILE,
            CalibrationError::NonAscending { .. } => CalibrationErrorCodes::NON_ASCENDING,
            CalibrationError::MissingChannel { .. } => CalibrationErrorCodes::MISSING_CHANNEL,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::DirectoryUnreadable { path, reason } => {
                format!("Error reading calibration folder {}: {}", path, reason)
            }
            CalibrationError::FileUnreadable { file, reason } => {
                format!("Error reading calibration file {}: {}", file, reason)
            }
            CalibrationError::MalformedRow {
                file,
                line,
                content,
            } => {
                format!(
                    "Invalid calibration data in {} line {}: {:?}",
                    file, line, content
                )
            }
            CalibrationError::InvalidNumber {
                file,
                line,
                field,
                value,
            } => {
                format!(
                    "Error parsing {} in {} line {}: {:?}",
                    field, file, line, value
                )
            }
            CalibrationError::InvalidSensitivity {
                file,
                line,
                content,
            } => {
                format!(
                    "Invalid sensitivity declaration in {} line {}: {:?}",
                    file, line, content
                )
            }
            CalibrationError::ChannelNotFound { file } => {
                format!("No channel found in calibration file: {}", file)
            }
            CalibrationError::EmptyFile { file } => {
                format!("No calibration data found in file: {}", file)
            }
            CalibrationError::NonAscending {
                file,
                line,
                frequency,
                previous,
            } => {
                format!(
                    "Frequency {} in {} line {} is below previous frequency {}",
                    frequency, file, line, previous
                )
            }
            CalibrationError::MissingChannel { channel } => {
                format!(
                    "No calibration data found for {} channel",
                    channel.label().to_uppercase()
                )
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}
