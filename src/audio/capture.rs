// Live capture - feeds the level meter from an input device
//
// Built on cpal when the `capture` feature is enabled. Without it, starting
// capture reports `AudioError::CaptureUnavailable` so the server can still
// run on webhook input alone.

use std::sync::Arc;

use super::meter::AudioLevelMeter;
use crate::config::AudioConfig;
use crate::error::AudioError;
#[cfg(feature = "capture")]
use crate::error::log_audio_error;

#[cfg(feature = "capture")]
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Running input stream; capture stops when dropped
pub struct CaptureStream {
    #[cfg(feature = "capture")]
    _stream: cpal::Stream,
    device_name: String,
}

impl CaptureStream {
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

/// Open the configured input device and start metering its buffers
///
/// The device is looked up by exact name; if absent the host's default
/// input device is used instead.
#[cfg(feature = "capture")]
pub fn start_capture(
    config: &AudioConfig,
    meter: Arc<AudioLevelMeter>,
) -> Result<CaptureStream, AudioError> {
    let host = cpal::default_host();
    let device = find_input_device(&host, &config.device_name)?;
    let device_name = device
        .name()
        .unwrap_or_else(|_| config.device_name.clone());

    if config.channels != 2 {
        return Err(AudioError::UnsupportedFormat {
            details: format!("{} channels requested, only stereo is metered", config.channels),
        });
    }

    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(config.frames_per_buffer),
    };

    let err_fn = |err: cpal::StreamError| {
        log_audio_error(
            &AudioError::HardwareError {
                details: err.to_string(),
            },
            "capture::input_stream",
        )
    };

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                meter.on_buffer(data);
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

    stream.play().map_err(|e| AudioError::HardwareError {
        details: format!("Input start failed: {}", e),
    })?;

    log::info!(
        "[Capture] Metering '{}' at {} Hz, {} frames per buffer",
        device_name,
        config.sample_rate,
        config.frames_per_buffer
    );

    Ok(CaptureStream {
        _stream: stream,
        device_name,
    })
}

#[cfg(feature = "capture")]
fn find_input_device(host: &cpal::Host, name: &str) -> Result<cpal::Device, AudioError> {
    let devices = host
        .input_devices()
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Failed to enumerate input devices: {:?}", e),
        })?;

    for device in devices {
        if device.name().map(|n| n == name).unwrap_or(false) {
            return Ok(device);
        }
    }

    log::warn!(
        "[Capture] Input device '{}' not found, falling back to default input",
        name
    );
    host.default_input_device()
        .ok_or_else(|| AudioError::DeviceNotFound {
            name: name.to_string(),
        })
}

#[cfg(not(feature = "capture"))]
pub fn start_capture(
    _config: &AudioConfig,
    _meter: Arc<AudioLevelMeter>,
) -> Result<CaptureStream, AudioError> {
    Err(AudioError::CaptureUnavailable)
}

#[cfg(all(test, not(feature = "capture")))]
mod tests {
    use super::*;
    use crate::analysis::LevelAdjuster;
    use crate::calibration::{CalibrationCurve, CalibrationStore};
    use crate::status::StatusBoard;

    #[test]
    fn test_capture_unavailable_without_feature() {
        let store = CalibrationStore::from_curves(
            1000.0,
            CalibrationCurve::default(),
            CalibrationCurve::default(),
        );
        let meter = AudioLevelMeter::new(
            LevelAdjuster::new(Arc::new(store), 94.0),
            Arc::new(StatusBoard::default()),
        );
        let result = start_capture(&AudioConfig::default(), Arc::new(meter));
        assert!(matches!(result, Err(AudioError::CaptureUnavailable)));
    }
}
