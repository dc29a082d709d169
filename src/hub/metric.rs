//! Metric wire format and metric names.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::calibration::Channel;
use crate::error::HubError;

/// Encoded metric shared by every subscriber of one publish
pub type Payload = Arc<str>;

/// One named sample, encoded as `{"name": ..., "value": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Encode a metric once for fan-out
pub fn encode(name: &str, value: f64) -> Result<Payload, HubError> {
    if !value.is_finite() {
        return Err(HubError::NonFiniteValue {
            name: name.to_string(),
            value,
        });
    }

    #[derive(Serialize)]
    struct Wire<'a> {
        name: &'a str,
        value: f64,
    }

    serde_json::to_string(&Wire { name, value })
        .map(Payload::from)
        .map_err(|err| HubError::EncodeFailed {
            name: name.to_string(),
            reason: err.to_string(),
        })
}

/// Level unit of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelUnit {
    Dbfs,
    Dbspl,
}

/// Names of levels computed from the local capture stream
pub fn direct_metric(channel: Channel, unit: LevelUnit) -> &'static str {
    match (channel, unit) {
        (Channel::Left, LevelUnit::Dbfs) => "Direct_Left_dBFS",
        (Channel::Right, LevelUnit::Dbfs) => "Direct_Right_dBFS",
        (Channel::Left, LevelUnit::Dbspl) => "Direct_Left_dBSPL",
        (Channel::Right, LevelUnit::Dbspl) => "Direct_Right_dBSPL",
    }
}

/// Names of levels pushed by the external metering application
pub fn external_metric(channel: Channel, unit: LevelUnit) -> &'static str {
    match (channel, unit) {
        (Channel::Left, LevelUnit::Dbfs) => "Left_dBFS",
        (Channel::Right, LevelUnit::Dbfs) => "Right_dBFS",
        (Channel::Left, LevelUnit::Dbspl) => "Left_dBSPL",
        (Channel::Right, LevelUnit::Dbspl) => "Right_dBSPL",
    }
}
