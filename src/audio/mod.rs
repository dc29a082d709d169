// Audio module - stereo level metering from live capture or WAV replay

pub mod capture;
pub mod meter;
pub mod wav;

pub use capture::{start_capture, CaptureStream};
pub use meter::{AudioLevelMeter, LevelReading};
pub use wav::{replay_wav, ReplaySummary};
