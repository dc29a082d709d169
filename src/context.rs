// AppContext: Dependency Injection Container
// Wires calibration, level conversion, status and fan-out together once at startup

use std::sync::Arc;

use crate::analysis::LevelAdjuster;
use crate::audio::AudioLevelMeter;
use crate::calibration::CalibrationStore;
use crate::config::AppConfig;
use crate::error::{log_calibration_error, CalibrationError};
use crate::hub::MetricHub;
use crate::status::{SampleCounter, StatusBoard};

/// AppContext: every long-lived component of the monitor
///
/// The meter, the hub and the status board share one [`SampleCounter`].
/// Everything here is immutable or internally synchronized, so the context
/// is cloned freely into HTTP handlers and the capture callback.
#[derive(Clone)]
pub struct AppContext {
    config: Arc<AppConfig>,
    store: Arc<CalibrationStore>,
    status: Arc<StatusBoard>,
    hub: Arc<MetricHub>,
    meter: Arc<AudioLevelMeter>,
}

impl AppContext {
    /// Load calibration from the configured directory and build the context
    ///
    /// # Errors
    /// Any calibration load failure; the monitor must not start without
    /// both channels calibrated.
    pub fn from_config(config: AppConfig) -> Result<Self, CalibrationError> {
        let store = CalibrationStore::load_with_extension(
            &config.calibration.directory,
            &config.calibration.extension,
            config.calibration.frequency_hz,
        )
        .map_err(|err| {
            log_calibration_error(&err, "AppContext::from_config");
            err
        })?;
        Ok(Self::with_store(config, store))
    }

    /// Build the context around an already loaded store
    pub fn with_store(config: AppConfig, store: CalibrationStore) -> Self {
        let counter = SampleCounter::new();
        let store = Arc::new(store);
        let status = Arc::new(StatusBoard::new(counter.clone()));
        let hub = Arc::new(MetricHub::new(counter));

        let adjuster = LevelAdjuster::new(Arc::clone(&store), config.levels.spl_offset_db);
        let mut meter = AudioLevelMeter::new(adjuster, Arc::clone(&status));
        if config.levels.publish_direct {
            meter = meter.with_hub(Arc::clone(&hub));
        }

        Self {
            config: Arc::new(config),
            store,
            status,
            hub,
            meter: Arc::new(meter),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &CalibrationStore {
        &self.store
    }

    pub fn status(&self) -> &Arc<StatusBoard> {
        &self.status
    }

    pub fn hub(&self) -> &Arc<MetricHub> {
        &self.hub
    }

    pub fn meter(&self) -> &Arc<AudioLevelMeter> {
        &self.meter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationCurve;
    use crate::hub::{DeliveryError, MetricSink, Payload};

    struct Count(std::sync::atomic::AtomicUsize);

    impl MetricSink for Count {
        fn deliver(&self, _payload: Payload) -> Result<(), DeliveryError> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            Ok(())
        }
    }

    fn empty_store() -> CalibrationStore {
        CalibrationStore::from_curves(
            1000.0,
            CalibrationCurve::default(),
            CalibrationCurve::default(),
        )
    }

    #[test]
    fn test_counter_shared_by_meter_hub_and_status() {
        let context = AppContext::with_store(AppConfig::default(), empty_store());
        context.meter().on_buffer(&[0.5, 0.5]);
        context.hub().publish("Left_dBSPL", 70.0).unwrap();
        // One buffer, four direct metrics, one external publish
        assert_eq!(context.status().snapshot().samples, 6);
        assert_eq!(context.hub().samples(), 6);
    }

    #[test]
    fn test_direct_publishing_can_be_disabled() {
        let mut config = AppConfig::default();
        config.levels.publish_direct = false;
        let context = AppContext::with_store(config, empty_store());
        let sink = Arc::new(Count(Default::default()));
        let hub = context.hub();
        hub.subscribe(hub.next_subscriber_id(), sink.clone()).unwrap();

        context.meter().on_buffer(&[0.5, 0.5]);

        assert_eq!(sink.0.load(std::sync::atomic::Ordering::Relaxed), 0);
        assert_eq!(context.status().snapshot().samples, 1);
    }

    #[test]
    fn test_missing_calibration_directory_fails() {
        let mut config = AppConfig::default();
        config.calibration.directory = "/nonexistent/ears".into();
        assert!(matches!(
            AppContext::from_config(config),
            Err(CalibrationError::DirectoryUnreadable { .. })
        ));
    }
}
