// Calibration module - microphone calibration curves
//
// Parses per-channel calibration files into immutable curves and answers
// sensitivity and interpolated-SPL queries for the level adjuster.

pub mod curve;
pub mod parser;
pub mod store;

pub use curve::{CalibrationCurve, DataPoint, Interpolation};
pub use parser::{parse_calibration, ParsedCalibration};
pub use store::{CalibrationStore, DEFAULT_EXTENSION};

use serde::{Deserialize, Serialize};

/// Measurement channel of the stereo stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Left, Channel::Right];

    /// Position in interleaved frames and per-channel arrays
    pub fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
        }
    }

    /// Metric name prefix
    pub fn label(self) -> &'static str {
        match self {
            Channel::Left => "Left",
            Channel::Right => "Right",
        }
    }
}
