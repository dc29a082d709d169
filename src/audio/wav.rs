// Offline replay - meters a stereo WAV file buffer by buffer
//
// Feeds the same AudioLevelMeter the live capture path uses, so a recording
// produces the readings the device would have.

use std::path::Path;

use super::meter::{AudioLevelMeter, LevelReading};
use crate::error::AudioError;

/// Result of metering a whole file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplaySummary {
    pub sample_rate: u32,
    /// Buffers handed to the meter
    pub buffers: usize,
    /// Stereo frames measured
    pub frames: usize,
    /// Reading of the final buffer
    pub last: Option<LevelReading>,
    /// Highest dBSPL seen per channel (`-inf` if always silent)
    pub max_left_dbspl: f64,
    pub max_right_dbspl: f64,
}

impl ReplaySummary {
    fn record(&mut self, reading: Option<LevelReading>) {
        if let Some(reading) = reading {
            self.buffers += 1;
            self.frames += reading.frames;
            self.max_left_dbspl = self.max_left_dbspl.max(reading.left_dbspl);
            self.max_right_dbspl = self.max_right_dbspl.max(reading.right_dbspl);
            self.last = Some(reading);
        }
    }
}

/// Meter `path` in buffers of `frames_per_buffer` stereo frames
///
/// Samples are decoded as the file is read; only one buffer is held at a time.
///
/// # Errors
/// Fails if the file cannot be opened or decoded, or is not stereo.
pub fn replay_wav<P: AsRef<Path>>(
    path: P,
    meter: &AudioLevelMeter,
    frames_per_buffer: usize,
) -> Result<ReplaySummary, AudioError> {
    let path = path.as_ref();
    let read_failed = |err: hound::Error| AudioError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    };

    let mut reader = hound::WavReader::open(path).map_err(read_failed)?;
    let spec = reader.spec();
    if spec.channels != 2 {
        return Err(AudioError::UnsupportedFormat {
            details: format!("{} has {} channels, expected 2", path.display(), spec.channels),
        });
    }

    log::info!(
        "[Replay] {}: {} Hz, {} frames",
        path.display(),
        spec.sample_rate,
        reader.duration()
    );

    let samples: Box<dyn Iterator<Item = Result<f32, hound::Error>> + '_> =
        match spec.sample_format {
            hound::SampleFormat::Float => Box::new(reader.samples::<f32>()),
            hound::SampleFormat::Int => {
                let scale = (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                Box::new(
                    reader
                        .samples::<i32>()
                        .map(move |sample| sample.map(|s| s as f32 / scale)),
                )
            }
        };

    let mut summary = ReplaySummary {
        sample_rate: spec.sample_rate,
        buffers: 0,
        frames: 0,
        last: None,
        max_left_dbspl: f64::NEG_INFINITY,
        max_right_dbspl: f64::NEG_INFINITY,
    };

    let buffer_len = frames_per_buffer.max(1) * 2;
    let mut buffer = Vec::with_capacity(buffer_len);
    for sample in samples {
        buffer.push(sample.map_err(read_failed)?);
        if buffer.len() == buffer_len {
            summary.record(meter.on_buffer(&buffer));
            buffer.clear();
        }
    }
    if !buffer.is_empty() {
        summary.record(meter.on_buffer(&buffer));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LevelAdjuster;
    use crate::calibration::{CalibrationCurve, CalibrationStore};
    use crate::status::StatusBoard;
    use std::sync::Arc;

    fn meter() -> AudioLevelMeter {
        let store = CalibrationStore::from_curves(
            1000.0,
            CalibrationCurve::default(),
            CalibrationCurve::default(),
        );
        AudioLevelMeter::new(
            LevelAdjuster::new(Arc::new(store), 94.0),
            Arc::new(StatusBoard::default()),
        )
    }

    fn write_wav(path: &Path, channels: u16, frames: usize, left: i16, right: i16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(left).unwrap();
            if channels == 2 {
                writer.write_sample(right).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_replay_constant_signal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half.wav");
        // 16384 / 32768 = 0.5 on the left, right silent
        write_wav(&path, 2, 5000, 16384, 0);

        let summary = replay_wav(&path, &meter(), 2048).unwrap();

        assert_eq!(summary.buffers, 3);
        assert_eq!(summary.frames, 5000);
        let expected = 20.0 * 0.5f64.log10() + 94.0;
        assert!((summary.max_left_dbspl - expected).abs() < 1e-6);
        assert_eq!(summary.max_right_dbspl, f64::NEG_INFINITY);
        assert_eq!(summary.last.unwrap().frames, 5000 - 2 * 2048);
    }

    #[test]
    fn test_replay_rejects_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, 100, 1000, 0);

        let err = replay_wav(&path, &meter(), 2048).unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_replay_truncated_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.wav");
        write_wav(&path, 2, 4096, 16384, 16384);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let err = replay_wav(&path, &meter(), 1024).unwrap_err();
        assert!(matches!(err, AudioError::FileReadFailed { .. }));
    }

    #[test]
    fn test_replay_missing_file() {
        let err = replay_wav("/nonexistent/take.wav", &meter(), 2048).unwrap_err();
        assert!(matches!(err, AudioError::FileReadFailed { .. }));
    }
}
