//! Level reports pushed by an external metering application.
//!
//! Two webhook bodies are accepted: input-level reports (RMS per input in
//! dBFS) and SPL meter samples (one calibrated level per meter). Values are
//! already final, so they bypass the [`LevelAdjuster`](crate::analysis::LevelAdjuster)
//! and go straight to the status board and the hub.

use serde::{Deserialize, Serialize};

use crate::calibration::Channel;
use crate::error::{HubError, IngestError};
use crate::hub::{external_metric, LevelUnit, MetricHub};
use crate::status::StatusBoard;

/// Body of an input-levels webhook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputLevelsSample {
    pub unit: String,
    /// RMS per input, index 0 left, index 1 right
    pub rms: Vec<f64>,
    pub peak: Vec<f64>,
    pub time_span_seconds: f64,
}

/// Body of an SPL meter webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplMeterSample {
    pub meter_number: i64,
    pub spl: f64,
    #[serde(default)]
    pub weighting: String,
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub leq: f64,
    #[serde(default)]
    pub is_rolling_leq: bool,
    #[serde(default)]
    pub rolling_leq_minutes: f64,
    #[serde(default)]
    pub leq1m: f64,
    #[serde(default)]
    pub leq10m: f64,
    #[serde(default)]
    pub sel: f64,
    #[serde(default)]
    pub elapsed_time: f64,
}

/// One externally measured channel level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternalLevel {
    pub channel: Channel,
    pub unit: LevelUnit,
    pub value: f64,
}

impl InputLevelsSample {
    /// Left and (if present) right dBFS levels; extra inputs are ignored
    pub fn levels(&self) -> Result<Vec<ExternalLevel>, IngestError> {
        if !self.unit.is_empty() && !self.unit.eq_ignore_ascii_case("dBFS") {
            return Err(IngestError::UnsupportedUnit {
                unit: self.unit.clone(),
            });
        }
        if self.rms.is_empty() {
            return Err(IngestError::MissingLevels);
        }

        Ok(Channel::ALL
            .iter()
            .zip(&self.rms)
            .map(|(&channel, &value)| ExternalLevel {
                channel,
                unit: LevelUnit::Dbfs,
                value,
            })
            .collect())
    }
}

impl SplMeterSample {
    /// Meter 1 measures the left channel, meter 2 the right
    pub fn level(&self) -> Result<ExternalLevel, IngestError> {
        let channel = match self.meter_number {
            1 => Channel::Left,
            2 => Channel::Right,
            meter => return Err(IngestError::UnknownMeter { meter }),
        };
        Ok(ExternalLevel {
            channel,
            unit: LevelUnit::Dbspl,
            value: self.spl,
        })
    }
}

/// Record levels as the latest external readings and publish each once
///
/// # Returns
/// Number of metrics published.
pub fn ingest(
    levels: &[ExternalLevel],
    status: &StatusBoard,
    hub: &MetricHub,
) -> Result<usize, HubError> {
    for level in levels {
        match level.unit {
            LevelUnit::Dbfs => status.record_external_dbfs(level.channel, level.value),
            LevelUnit::Dbspl => status.record_external_dbspl(level.channel, level.value),
        }
    }
    for level in levels {
        hub.publish(external_metric(level.channel, level.unit), level.value)?;
    }
    Ok(levels.len())
}
