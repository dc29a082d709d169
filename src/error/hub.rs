// Metric hub error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Metric hub error code constants
///
/// Error code range: 3001-3003
pub struct HubErrorCodes {}

impl HubErrorCodes {
    /// Metric could not be encoded to the wire format
    pub const ENCODE_FAILED: i32 = 3001;

    /// Metric value is NaN or infinite
    pub const NON_FINITE_VALUE: i32 = 3002;

    /// Subscriber registry lock was poisoned
    pub const REGISTRY_POISONED: i32 = 3003;
}

/// Log a hub error with structured context
pub fn log_hub_error(err: &HubError, context: &str) {
    error!(
        "Hub error in {}: code={}, component=MetricHub, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors that fail a whole `publish` call before any delivery attempt
///
/// Per-subscriber delivery failures never surface here; they prune the
/// subscriber and are only logged.
///
/// Error code ranges: 3001-3003
#[derive(Debug, Clone, PartialEq)]
pub enum HubError {
    /// Metric could not be serialized
    EncodeFailed { name: String, reason: String },

    /// JSON cannot carry NaN or infinity
    NonFiniteValue { name: String, value: f64 },

    /// A thread panicked while holding the registry lock
    RegistryPoisoned,
}

impl ErrorCode for HubError {
    fn code(&self) -> i32 {
        match self {
            HubError::EncodeFailed { .. } => HubErrorCodes::ENCODE_FAILED,
            HubError::NonFiniteValue { .. } => HubErrorCodes::NON_FINITE_VALUE,
            HubError::RegistryPoisoned => HubErrorCodes::REGISTRY_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            HubError::EncodeFailed { name, reason } => {
                format!("Failed to encode metric {}: {}", name, reason)
            }
            HubError::NonFiniteValue { name, value } => {
                format!("Metric {} has non-finite value {}", name, value)
            }
            HubError::RegistryPoisoned => "Subscriber registry lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HubError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for HubError {}
