// LevelAdjuster - dBFS to dBSPL conversion
//
// dBSPL = dBFS + fixed offset + channel sensitivity + interpolated curve SPL
//
// Every calibration term degrades to 0.0 when data is missing, so the
// adjuster always returns a value.

use std::sync::Arc;

use crate::calibration::{CalibrationStore, Channel};

/// Offset assuming 0 dBFS corresponds to 94 dB SPL
pub const DEFAULT_SPL_OFFSET: f64 = 94.0;

/// Applies calibration to full-scale levels
#[derive(Debug, Clone)]
pub struct LevelAdjuster {
    store: Arc<CalibrationStore>,
    fixed_offset: f64,
}

impl LevelAdjuster {
    pub fn new(store: Arc<CalibrationStore>, fixed_offset: f64) -> Self {
        Self {
            store,
            fixed_offset,
        }
    }

    pub fn fixed_offset(&self) -> f64 {
        self.fixed_offset
    }

    pub fn store(&self) -> &CalibrationStore {
        &self.store
    }

    /// Convert a channel's dBFS reading to dBSPL
    ///
    /// Non-finite input passes through (silence stays `-inf`).
    pub fn adjust(&self, channel: Channel, dbfs: f64) -> f64 {
        dbfs + self.fixed_offset
            + self.store.sensitivity(channel)
            + self.store.interpolated_spl(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CalibrationCurve, DataPoint};

    fn adjuster(frequency: f64) -> LevelAdjuster {
        let curve = CalibrationCurve::new(
            -2.5,
            vec![
                DataPoint::new(20.0, 70.0, 0.0),
                DataPoint::new(1000.0, 94.0, 0.0),
                DataPoint::new(20000.0, 80.0, 0.0),
            ],
        );
        let store = CalibrationStore::from_curves(frequency, curve.clone(), curve);
        LevelAdjuster::new(Arc::new(store), DEFAULT_SPL_OFFSET)
    }

    #[test]
    fn test_adjust_sums_all_terms() {
        let adjuster = adjuster(500.0);
        let interpolated = 70.0 + (94.0 - 70.0) * (500.0 - 20.0) / (1000.0 - 20.0);
        let expected = -6.0 + 94.0 + -2.5 + interpolated;
        assert!((adjuster.adjust(Channel::Left, -6.0) - expected).abs() < 1e-9);
        assert!((adjuster.adjust(Channel::Left, -6.0) - 167.2551).abs() < 1e-4);
    }

    #[test]
    fn test_adjust_is_deterministic() {
        let adjuster = adjuster(1234.5);
        let first = adjuster.adjust(Channel::Right, -20.0);
        let second = adjuster.adjust(Channel::Right, -20.0);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_out_of_range_curve_contributes_zero() {
        let adjuster = adjuster(30000.0);
        assert_eq!(adjuster.adjust(Channel::Left, -10.0), -10.0 + 94.0 - 2.5);
    }

    #[test]
    fn test_missing_calibration_leaves_only_offset() {
        let store = CalibrationStore::from_curves(
            1000.0,
            CalibrationCurve::default(),
            CalibrationCurve::default(),
        );
        let adjuster = LevelAdjuster::new(Arc::new(store), 90.0);
        assert_eq!(adjuster.adjust(Channel::Right, -3.0), 87.0);
    }

    #[test]
    fn test_silence_stays_negative_infinity() {
        let adjuster = adjuster(1000.0);
        assert_eq!(
            adjuster.adjust(Channel::Left, f64::NEG_INFINITY),
            f64::NEG_INFINITY
        );
    }
}
