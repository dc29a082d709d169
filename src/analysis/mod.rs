// Analysis module - level math for the measurement pipeline
//
// Pure functions only: RMS and dBFS from interleaved stereo buffers, and the
// dBFS to dBSPL adjustment driven by calibration data.

pub mod adjust;
pub mod level;

pub use adjust::{LevelAdjuster, DEFAULT_SPL_OFFSET};
pub use level::{dbfs, stereo_rms, StereoRms};
