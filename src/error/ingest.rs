// Inbound level report error types and constants

use crate::error::ErrorCode;
use std::fmt;

/// Ingestion error code constants
///
/// Error code range: 4001-4003
pub struct IngestErrorCodes {}

impl IngestErrorCodes {
    /// SPL meter number does not map to a channel
    pub const UNKNOWN_METER: i32 = 4001;

    /// Input-levels report carried no RMS values
    pub const MISSING_LEVELS: i32 = 4002;

    /// Input-levels report is not in dBFS
    pub const UNSUPPORTED_UNIT: i32 = 4003;
}

/// Well-formed JSON that still cannot be turned into channel levels
///
/// Rejected at the HTTP boundary; nothing is recorded or published.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    UnknownMeter { meter: i64 },
    MissingLevels,
    UnsupportedUnit { unit: String },
}

impl ErrorCode for IngestError {
    fn code(&self) -> i32 {
        match self {
            IngestError::UnknownMeter { .. } => IngestErrorCodes::UNKNOWN_METER,
            IngestError::MissingLevels => IngestErrorCodes::MISSING_LEVELS,
            IngestError::UnsupportedUnit { .. } => IngestErrorCodes::UNSUPPORTED_UNIT,
        }
    }

    fn message(&self) -> String {
        match self {
            IngestError::UnknownMeter { meter } => {
                format!("Unknown SPL meter {}, expected 1 (left) or 2 (right)", meter)
            }
            IngestError::MissingLevels => "Input levels report has no rms values".to_string(),
            IngestError::UnsupportedUnit { unit } => {
                format!("Input levels unit {} is not supported, expected dBFS", unit)
            }
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IngestError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for IngestError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_codes() {
        assert_eq!(IngestError::UnknownMeter { meter: 3 }.code(), 4001);
        assert_eq!(IngestError::MissingLevels.code(), 4002);
        assert_eq!(
            IngestError::UnsupportedUnit {
                unit: "dBV".to_string()
            }
            .code(),
            4003
        );
        assert!(IngestError::UnknownMeter { meter: 7 }
            .message()
            .contains("meter 7"));
    }
}
