//! Subscriber-side delivery seam.
//!
//! The hub only ever hands payloads to a [`MetricSink`]. Network writes happen
//! elsewhere (a per-connection writer task draining a bounded queue), so a
//! delivery under the registry lock never waits on a socket.

use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::metric::Payload;

/// Why a payload could not be handed to a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Subscriber connection is gone
    Closed,
    /// Subscriber is not keeping up; its queue is full
    Backpressure,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Closed => write!(f, "subscriber closed"),
            DeliveryError::Backpressure => write!(f, "subscriber queue full"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Destination of published metrics
///
/// Implementations must not block: `deliver` runs while the hub holds its
/// registry lock, possibly on the audio capture thread.
pub trait MetricSink: Send + Sync {
    fn deliver(&self, payload: Payload) -> Result<(), DeliveryError>;
}

/// Sink backed by a bounded queue drained by a writer task
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: mpsc::Sender<Payload>,
}

impl QueueSink {
    /// Create a sink and the receiver its writer task drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl MetricSink for QueueSink {
    fn deliver(&self, payload: Payload) -> Result<(), DeliveryError> {
        self.tx.try_send(payload).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::Backpressure,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
