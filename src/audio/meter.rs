// AudioLevelMeter - per-buffer stereo level measurement
//
// Runs on the capture thread. Everything up to the optional hub publish is
// lock-free: RMS over the buffer, immutable calibration reads, atomic stores
// into the status board.

use std::sync::Arc;

use log::{debug, warn};

use crate::analysis::{dbfs, stereo_rms, LevelAdjuster};
use crate::calibration::Channel;
use crate::hub::{direct_metric, LevelUnit, MetricHub};
use crate::status::StatusBoard;

/// Levels measured from one buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReading {
    pub left_dbfs: f64,
    pub right_dbfs: f64,
    pub left_dbspl: f64,
    pub right_dbspl: f64,
    /// Complete stereo frames in the buffer
    pub frames: usize,
}

impl LevelReading {
    pub fn dbfs(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Left => self.left_dbfs,
            Channel::Right => self.right_dbfs,
        }
    }

    pub fn dbspl(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Left => self.left_dbspl,
            Channel::Right => self.right_dbspl,
        }
    }
}

/// Converts interleaved stereo buffers into calibrated levels
pub struct AudioLevelMeter {
    adjuster: LevelAdjuster,
    status: Arc<StatusBoard>,
    hub: Option<Arc<MetricHub>>,
}

impl AudioLevelMeter {
    pub fn new(adjuster: LevelAdjuster, status: Arc<StatusBoard>) -> Self {
        Self {
            adjuster,
            status,
            hub: None,
        }
    }

    /// Also publish `Direct_*` metrics for every measured buffer
    pub fn with_hub(mut self, hub: Arc<MetricHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn adjuster(&self) -> &LevelAdjuster {
        &self.adjuster
    }

    /// Measure one interleaved `[L, R, L, R, ...]` buffer
    ///
    /// An odd trailing sample is dropped as a truncated final frame. A buffer
    /// without a single complete frame is ignored and leaves the latest
    /// values untouched.
    ///
    /// # Returns
    /// The reading stored in the status board, or `None` if the buffer was
    /// ignored.
    pub fn on_buffer(&self, samples: &[f32]) -> Option<LevelReading> {
        let Some(levels) = stereo_rms(samples) else {
            debug!(
                "[AudioLevelMeter] Ignoring buffer without a complete frame ({} samples)",
                samples.len()
            );
            return None;
        };
        if levels.dropped_samples > 0 {
            warn!(
                "[AudioLevelMeter] Odd-length buffer ({} samples), dropping trailing sample",
                samples.len()
            );
        }

        let left_dbfs = dbfs(levels.left);
        let right_dbfs = dbfs(levels.right);
        let reading = LevelReading {
            left_dbfs,
            right_dbfs,
            left_dbspl: self.adjuster.adjust(Channel::Left, left_dbfs),
            right_dbspl: self.adjuster.adjust(Channel::Right, right_dbfs),
            frames: levels.frames,
        };

        for channel in Channel::ALL {
            self.status
                .record_direct(channel, reading.dbfs(channel), reading.dbspl(channel));
        }
        self.status.counter().increment();

        if let Some(hub) = &self.hub {
            self.publish(hub, &reading);
        }

        Some(reading)
    }

    fn publish(&self, hub: &MetricHub, reading: &LevelReading) {
        for channel in Channel::ALL {
            for (unit, value) in [
                (LevelUnit::Dbfs, reading.dbfs(channel)),
                (LevelUnit::Dbspl, reading.dbspl(channel)),
            ] {
                // Silence (-inf) has no JSON representation
                if !value.is_finite() {
                    continue;
                }
                if let Err(err) = hub.publish(direct_metric(channel, unit), value) {
                    debug!("[AudioLevelMeter] Publish skipped: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DEFAULT_SPL_OFFSET;
    use crate::calibration::{CalibrationCurve, CalibrationStore, DataPoint};
    use crate::hub::{DeliveryError, MetricSink, Payload};
    use std::sync::Mutex;

    fn meter(status: Arc<StatusBoard>) -> AudioLevelMeter {
        let curve = CalibrationCurve::new(
            -1.0,
            vec![
                DataPoint::new(100.0, 10.0, 0.0),
                DataPoint::new(2000.0, 10.0, 0.0),
            ],
        );
        let store = CalibrationStore::from_curves(1000.0, curve.clone(), curve);
        AudioLevelMeter::new(
            LevelAdjuster::new(Arc::new(store), DEFAULT_SPL_OFFSET),
            status,
        )
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl MetricSink for Collect {
        fn deliver(&self, payload: Payload) -> Result<(), DeliveryError> {
            self.0.lock().unwrap().push(payload.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_constant_buffer_levels() {
        let status = Arc::new(StatusBoard::default());
        let meter = meter(status.clone());
        // Left at 0.5, right at 0.25
        let samples: Vec<f32> = (0..1024)
            .map(|i| if i % 2 == 0 { 0.5 } else { 0.25 })
            .collect();

        let reading = meter.on_buffer(&samples).unwrap();

        let left = 20.0 * 0.5f64.log10();
        let right = 20.0 * 0.25f64.log10();
        assert!((reading.left_dbfs - left).abs() < 1e-9);
        assert!((reading.right_dbfs - right).abs() < 1e-9);
        assert!((reading.left_dbspl - (left + 94.0 - 1.0 + 10.0)).abs() < 1e-9);
        assert_eq!(reading.frames, 512);

        let direct = status.direct();
        assert_eq!(direct.left_dbfs, reading.left_dbfs);
        assert_eq!(direct.right_dbspl, reading.right_dbspl);
        assert_eq!(status.counter().get(), 1);
    }

    #[test]
    fn test_silence_yields_negative_infinity() {
        let status = Arc::new(StatusBoard::default());
        let meter = meter(status.clone());
        let reading = meter.on_buffer(&[0.0; 256]).unwrap();
        assert_eq!(reading.left_dbfs, f64::NEG_INFINITY);
        assert_eq!(reading.right_dbspl, f64::NEG_INFINITY);
        assert_eq!(status.direct().left_dbfs, f64::NEG_INFINITY);
    }

    #[test]
    fn test_odd_buffer_drops_trailing_sample() {
        let meter = meter(Arc::new(StatusBoard::default()));
        // Trailing 1.0 would raise the left level if it were counted
        let reading = meter.on_buffer(&[0.5, 0.5, 0.5, 0.5, 1.0]).unwrap();
        assert_eq!(reading.frames, 2);
        assert!((reading.left_dbfs - 20.0 * 0.5f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_buffer_leaves_state_untouched() {
        let status = Arc::new(StatusBoard::default());
        let meter = meter(status.clone());
        assert!(meter.on_buffer(&[]).is_none());
        assert!(meter.on_buffer(&[0.3]).is_none());
        assert!(status.direct().left_dbfs.is_nan());
        assert_eq!(status.counter().get(), 0);
    }

    #[test]
    fn test_publishes_direct_metrics_skipping_silence() {
        let status = Arc::new(StatusBoard::default());
        let hub = Arc::new(MetricHub::new(status.counter().clone()));
        let sink = Arc::new(Collect::default());
        hub.subscribe(hub.next_subscriber_id(), sink.clone())
            .unwrap();
        let meter = meter(status.clone()).with_hub(hub);

        // Right channel silent
        let samples: Vec<f32> = (0..64)
            .map(|i| if i % 2 == 0 { 0.1 } else { 0.0 })
            .collect();
        meter.on_buffer(&samples).unwrap();

        let received = sink.0.lock().unwrap().clone();
        assert_eq!(received.len(), 2);
        assert!(received[0].contains("Direct_Left_dBFS"));
        assert!(received[1].contains("Direct_Left_dBSPL"));
        // One buffer plus two publishes
        assert_eq!(status.counter().get(), 3);
    }
}
