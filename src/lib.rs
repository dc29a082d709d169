// SPL Monitor Core - calibrated sound level metering
// Stereo level measurement, microphone calibration, and live metric fan-out

// Module declarations
pub mod analysis;
pub mod audio;
pub mod calibration;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod hub;
pub mod ingest;
pub mod status;

// Re-exports for convenience
pub use analysis::LevelAdjuster;
pub use audio::{AudioLevelMeter, LevelReading};
pub use calibration::{CalibrationStore, Channel};
pub use config::AppConfig;
pub use context::AppContext;
pub use hub::{Metric, MetricHub};
pub use status::{StatusBoard, StatusSnapshot};
