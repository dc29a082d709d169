//! RMS and dBFS computation.
//!
//! Sums are accumulated in f64 so long buffers of f32 samples do not lose
//! precision.

/// Per-channel RMS of one interleaved stereo buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoRms {
    pub left: f64,
    pub right: f64,
    /// Complete frames measured
    pub frames: usize,
    /// Samples ignored because the buffer had odd length
    pub dropped_samples: usize,
}

/// RMS per channel of an interleaved `[L, R, L, R, ...]` buffer
///
/// A trailing sample of an odd-length buffer is treated as a truncated final
/// frame and ignored. Returns `None` when the buffer holds no complete frame.
pub fn stereo_rms(samples: &[f32]) -> Option<StereoRms> {
    let frames = samples.len() / 2;
    if frames == 0 {
        return None;
    }

    let mut sum_left = 0.0f64;
    let mut sum_right = 0.0f64;
    for frame in samples.chunks_exact(2) {
        let left = frame[0] as f64;
        let right = frame[1] as f64;
        sum_left += left * left;
        sum_right += right * right;
    }

    Some(StereoRms {
        left: (sum_left / frames as f64).sqrt(),
        right: (sum_right / frames as f64).sqrt(),
        frames,
        dropped_samples: samples.len() % 2,
    })
}

/// Level relative to digital full scale
///
/// `rms == 0.0` yields negative infinity.
pub fn dbfs(rms: f64) -> f64 {
    20.0 * rms.log10()
}
