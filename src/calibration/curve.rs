// Calibration curve and linear interpolation
//
// A curve is the frequency response of one microphone capsule as shipped in
// its calibration file: ascending (frequency, SPL, phase) rows plus the scalar
// sensitivity declared in the file header.

use serde::Serialize;

/// One calibration row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    /// Frequency in Hz
    pub frequency: f64,
    /// Correction in dB at this frequency
    pub spl: f64,
    /// Phase in degrees (carried through, unused by the level path)
    pub phase: f64,
}

impl DataPoint {
    pub fn new(frequency: f64, spl: f64, phase: f64) -> Self {
        Self {
            frequency,
            spl,
            phase,
        }
    }
}

/// Result of looking a frequency up in a curve
///
/// Kept as a sum type so the out-of-range and empty cases stay observable;
/// only the level adjuster collapses them to 0.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolation {
    /// Frequency lies within the curve
    Found(f64),
    /// Frequency lies outside `[min, max]`
    OutOfRange { frequency: f64, min: f64, max: f64 },
    /// Curve has no points
    Empty,
}

impl Interpolation {
    /// Collapse to a plain value, substituting 0.0 for any miss
    pub fn value_or_zero(self) -> f64 {
        match self {
            Interpolation::Found(spl) => spl,
            Interpolation::OutOfRange { .. } | Interpolation::Empty => 0.0,
        }
    }
}

/// Per-channel calibration data, immutable after loading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationCurve {
    sensitivity: f64,
    points: Vec<DataPoint>,
}

impl CalibrationCurve {
    pub fn new(sensitivity: f64, points: Vec<DataPoint>) -> Self {
        Self {
            sensitivity,
            points,
        }
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lowest and highest frequency covered, if any
    pub fn frequency_range(&self) -> Option<(f64, f64)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.frequency, last.frequency)),
            _ => None,
        }
    }

    /// Interpolate the SPL correction at `frequency`
    pub fn interpolate(&self, frequency: f64) -> Interpolation {
        interpolate(&self.points, frequency)
    }
}

/// Linear interpolation over ascending points
///
/// Uses the first segment `[p[i], p[i+1]]` that contains `frequency`.
/// A zero-width segment yields `p[i].spl`.
pub fn interpolate(points: &[DataPoint], frequency: f64) -> Interpolation {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Interpolation::Empty,
    };

    // NaN compares false everywhere, so reject it up front as out of range
    if frequency.is_nan() || frequency < first.frequency || frequency > last.frequency {
        return Interpolation::OutOfRange {
            frequency,
            min: first.frequency,
            max: last.frequency,
        };
    }

    if points.len() == 1 {
        return Interpolation::Found(first.spl);
    }

    for pair in points.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if frequency >= lo.frequency && frequency <= hi.frequency {
            let width = hi.frequency - lo.frequency;
            if width == 0.0 {
                return Interpolation::Found(lo.spl);
            }
            let spl = lo.spl + (hi.spl - lo.spl) * (frequency - lo.frequency) / width;
            return Interpolation::Found(spl);
        }
    }

    // Only reachable with unordered points
    Interpolation::OutOfRange {
        frequency,
        min: first.frequency,
        max: last.frequency,
    }
}
