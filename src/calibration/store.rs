// CalibrationStore - per-channel calibration curves loaded from a directory
//
// The store is built by a single load pass at startup and is read-only
// afterwards, so the capture thread can query it without locking.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use super::curve::{CalibrationCurve, Interpolation};
use super::parser::parse_calibration;
use super::Channel;
use crate::error::CalibrationError;

/// Extension of calibration files picked up by [`CalibrationStore::load`]
pub const DEFAULT_EXTENSION: &str = "txt";

/// Left and right calibration curves plus the measurement frequency
#[derive(Debug)]
pub struct CalibrationStore {
    frequency: f64,
    left: CalibrationCurve,
    right: CalibrationCurve,
    /// Whether a lookup miss was already reported at warn level, per channel
    miss_reported: [AtomicBool; 2],
}

impl CalibrationStore {
    /// Load every `.txt` calibration file in `directory`
    ///
    /// # Arguments
    /// * `directory` - Folder containing the calibration files
    /// * `frequency` - Frequency (Hz) at which the curves are interpolated
    ///
    /// # Errors
    /// Any unreadable file, malformed row, unmarked file, or a channel left
    /// without data fails the whole load.
    pub fn load<P: AsRef<Path>>(directory: P, frequency: f64) -> Result<Self, CalibrationError> {
        Self::load_with_extension(directory, DEFAULT_EXTENSION, frequency)
    }

    /// Load calibration files matching `extension` in `directory`
    ///
    /// Files are visited in file-name order. When two files declare the
    /// same channel, the later one replaces the earlier one entirely.
    pub fn load_with_extension<P: AsRef<Path>>(
        directory: P,
        extension: &str,
        frequency: f64,
    ) -> Result<Self, CalibrationError> {
        let directory = directory.as_ref();
        let unreadable = |err: std::io::Error| CalibrationError::DirectoryUnreadable {
            path: directory.display().to_string(),
            reason: err.to_string(),
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(directory).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            let matches_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == extension)
                .unwrap_or(false);
            if path.is_file() && matches_extension {
                files.push(path);
            }
        }
        files.sort();

        let mut left = CalibrationCurve::default();
        let mut right = CalibrationCurve::default();

        for path in &files {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let bytes = fs::read(path).map_err(|err| CalibrationError::FileUnreadable {
                file: name.clone(),
                reason: err.to_string(),
            })?;
            let contents = String::from_utf8_lossy(&bytes);
            let parsed = parse_calibration(&name, &contents)?;

            info!(
                "[Calibration] Loaded {}: channel={}, points={}, sensitivity={:.2}dB",
                name,
                parsed.channel.label(),
                parsed.curve.points().len(),
                parsed.curve.sensitivity()
            );

            match parsed.channel {
                Channel::Left => left = parsed.curve,
                Channel::Right => right = parsed.curve,
            }
        }

        if left.is_empty() {
            return Err(CalibrationError::MissingChannel {
                channel: Channel::Left,
            });
        }
        if right.is_empty() {
            return Err(CalibrationError::MissingChannel {
                channel: Channel::Right,
            });
        }

        Ok(Self::from_curves(frequency, left, right))
    }

    /// Build a store from curves that are already in memory
    ///
    /// Unlike [`load`](Self::load) this does not reject empty curves; lookups
    /// on an empty curve degrade to 0.0.
    pub fn from_curves(frequency: f64, left: CalibrationCurve, right: CalibrationCurve) -> Self {
        Self {
            frequency,
            left,
            right,
            miss_reported: [AtomicBool::new(false), AtomicBool::new(false)],
        }
    }

    /// Frequency (Hz) used for interpolation
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn curve(&self, channel: Channel) -> &CalibrationCurve {
        match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }

    /// Sensitivity declared by the channel's calibration file, 0.0 if none
    pub fn sensitivity(&self, channel: Channel) -> f64 {
        self.curve(channel).sensitivity()
    }

    /// Interpolate the channel's curve at the configured frequency
    pub fn lookup(&self, channel: Channel) -> Interpolation {
        self.curve(channel).interpolate(self.frequency)
    }

    /// Interpolated SPL at the configured frequency, 0.0 on any miss
    ///
    /// Misses are logged rather than returned: a calibration gap must not stop
    /// the measurement loop. The first miss per channel is a warning, repeats
    /// are debug output.
    pub fn interpolated_spl(&self, channel: Channel) -> f64 {
        let lookup = self.lookup(channel);
        if !matches!(lookup, Interpolation::Found(_)) {
            self.report_miss(channel, lookup);
        }
        lookup.value_or_zero()
    }

    fn report_miss(&self, channel: Channel, lookup: Interpolation) {
        let first = !self.miss_reported[channel.index()].swap(true, Ordering::Relaxed);
        match lookup {
            Interpolation::OutOfRange {
                frequency,
                min,
                max,
            } if first => warn!(
                "[Calibration] Error interpolating SPL: frequency {:.2} is out of range [{:.2}, {:.2}] for {} channel, using 0.0",
                frequency,
                min,
                max,
                channel.label()
            ),
            Interpolation::Empty if first => warn!(
                "[Calibration] Error interpolating SPL: no calibration points for {} channel, using 0.0",
                channel.label()
            ),
            _ => debug!(
                "[Calibration] Interpolation miss for {} channel: {:?}",
                channel.label(),
                lookup
            ),
        }
    }
}
