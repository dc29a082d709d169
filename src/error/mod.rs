// Error types for the SPL monitor
//
// This module defines custom error types for audio capture, calibration loading,
// metric publishing and inbound level reports, each with stable error codes.

mod audio;
mod calibration;
mod hub;
mod ingest;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use hub::{log_hub_error, HubError, HubErrorCodes};
pub use ingest::{IngestError, IngestErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so HTTP and CLI surfaces can report failures
/// consistently.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
