// MetricHub: fan-out of named metrics to live subscribers
// Single Responsibility: subscriber registry and delivery

pub mod metric;
pub mod sink;

pub use metric::{direct_metric, encode, external_metric, LevelUnit, Metric, Payload};
pub use sink::{DeliveryError, MetricSink, QueueSink};

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use crate::error::HubError;
use crate::status::SampleCounter;

/// Identity of one subscriber connection, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a successful publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delivery {
    /// Subscribers that accepted the payload
    pub delivered: usize,
    /// Subscribers removed because delivery failed
    pub pruned: usize,
}

/// Thread-safe registry of subscribers
///
/// One mutex guards the registry and the whole iterate-and-deliver loop, so
/// removal on remote close and removal on failed delivery are serialized: a
/// subscriber is removed at most once and never receives anything after
/// removal. Deliveries are non-blocking hand-offs (see [`MetricSink`]), which
/// keeps the critical section short and isolates slow subscribers.
pub struct MetricHub {
    subscribers: Mutex<HashMap<SubscriberId, Arc<dyn MetricSink>>>,
    next_id: AtomicU64,
    counter: SampleCounter,
}

impl MetricHub {
    /// Create an empty hub that bumps `counter` on every successful publish
    pub fn new(counter: SampleCounter) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            counter,
        }
    }

    /// Allocate an identity for a new connection
    pub fn next_subscriber_id(&self) -> SubscriberId {
        SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // ========================================================================
    // REGISTRY
    // ========================================================================

    /// Register a subscriber
    ///
    /// Idempotent: subscribing the same id again replaces its sink.
    pub fn subscribe(&self, id: SubscriberId, sink: Arc<dyn MetricSink>) -> Result<(), HubError> {
        let mut subscribers = self.registry()?;
        if subscribers.insert(id, sink).is_none() {
            debug!(
                "[MetricHub] Subscriber {} registered ({} active)",
                id,
                subscribers.len()
            );
        }
        Ok(())
    }

    /// Remove a subscriber
    ///
    /// # Returns
    /// `true` if the subscriber was registered; removing twice is a no-op.
    pub fn unsubscribe(&self, id: SubscriberId) -> Result<bool, HubError> {
        let mut subscribers = self.registry()?;
        let removed = subscribers.remove(&id).is_some();
        if removed {
            debug!(
                "[MetricHub] Subscriber {} removed ({} active)",
                id,
                subscribers.len()
            );
        }
        Ok(removed)
    }

    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.registry()
            .map(|subscribers| subscribers.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Total successful publishes plus measured buffers
    pub fn samples(&self) -> u64 {
        self.counter.get()
    }

    // ========================================================================
    // PUBLISH
    // ========================================================================

    /// Deliver `{name, value}` to every current subscriber
    ///
    /// The metric is encoded once and the same payload is handed to each
    /// subscriber. A subscriber whose delivery fails is removed; the others
    /// are still served and the call still succeeds.
    ///
    /// # Errors
    /// Only encoding failures (including non-finite values) and a poisoned
    /// registry fail the call, always before any delivery attempt.
    pub fn publish(&self, name: &str, value: f64) -> Result<Delivery, HubError> {
        let payload = encode(name, value)?;

        let mut subscribers = self.registry()?;
        let mut delivery = Delivery::default();
        let mut failed = Vec::new();

        for (id, sink) in subscribers.iter() {
            match sink.deliver(Payload::clone(&payload)) {
                Ok(()) => delivery.delivered += 1,
                Err(err) => {
                    warn!("[MetricHub] Error sending message to {}: {}", id, err);
                    failed.push(*id);
                }
            }
        }

        for id in failed {
            subscribers.remove(&id);
            delivery.pruned += 1;
        }
        drop(subscribers);

        self.counter.increment();
        Ok(delivery)
    }

    fn registry(&self) -> Result<MutexGuard<'_, HashMap<SubscriberId, Arc<dyn MetricSink>>>, HubError> {
        self.subscribers
            .lock()
            .map_err(|_| HubError::RegistryPoisoned)
    }
}

impl Default for MetricHub {
    fn default() -> Self {
        Self::new(SampleCounter::new())
    }
}
