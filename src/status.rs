//! Latest-value status board and periodic reporter.
//!
//! Producers (capture callback, webhook handlers) store into atomics, so
//! reading a snapshot never blocks them. No history is kept.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::calibration::Channel;

/// Monotonic count of measured buffers and published metrics
///
/// Shared by the level meter and the metric hub. Observability only.
#[derive(Debug, Clone, Default)]
pub struct SampleCounter(Arc<AtomicU64>);

impl SampleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// f64 stored as its bit pattern
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Latest dBFS and dBSPL per channel for one measurement path
#[derive(Debug)]
struct LevelCells {
    dbfs: [AtomicF64; 2],
    dbspl: [AtomicF64; 2],
}

impl LevelCells {
    fn new() -> Self {
        // NaN marks "no reading yet"
        Self {
            dbfs: [AtomicF64::new(f64::NAN), AtomicF64::new(f64::NAN)],
            dbspl: [AtomicF64::new(f64::NAN), AtomicF64::new(f64::NAN)],
        }
    }

    fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            left_dbfs: self.dbfs[0].load(),
            right_dbfs: self.dbfs[1].load(),
            left_dbspl: self.dbspl[0].load(),
            right_dbspl: self.dbspl[1].load(),
        }
    }
}

/// Four latest values of one measurement path
///
/// Non-finite values serialize as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelSnapshot {
    pub left_dbfs: f64,
    pub right_dbfs: f64,
    pub left_dbspl: f64,
    pub right_dbspl: f64,
}

/// Point-in-time view of the whole board
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Levels computed from the local capture stream
    pub direct: LevelSnapshot,
    /// Levels pushed by the external metering application
    pub external: LevelSnapshot,
    pub samples: u64,
}

/// Process-wide latest-value state
#[derive(Debug)]
pub struct StatusBoard {
    direct: LevelCells,
    external: LevelCells,
    counter: SampleCounter,
    started_at: Instant,
}

impl StatusBoard {
    pub fn new(counter: SampleCounter) -> Self {
        Self {
            direct: LevelCells::new(),
            external: LevelCells::new(),
            counter,
            started_at: Instant::now(),
        }
    }

    pub fn counter(&self) -> &SampleCounter {
        &self.counter
    }

    pub fn uptime_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Store one buffer's worth of direct readings
    pub fn record_direct(&self, channel: Channel, dbfs: f64, dbspl: f64) {
        self.direct.dbfs[channel.index()].store(dbfs);
        self.direct.dbspl[channel.index()].store(dbspl);
    }

    pub fn record_external_dbfs(&self, channel: Channel, dbfs: f64) {
        self.external.dbfs[channel.index()].store(dbfs);
    }

    pub fn record_external_dbspl(&self, channel: Channel, dbspl: f64) {
        self.external.dbspl[channel.index()].store(dbspl);
    }

    pub fn direct(&self) -> LevelSnapshot {
        self.direct.snapshot()
    }

    pub fn external(&self) -> LevelSnapshot {
        self.external.snapshot()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            direct: self.direct(),
            external: self.external(),
            samples: self.counter.get(),
        }
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(SampleCounter::new())
    }
}

/// Render a level for fixed-width display
pub fn format_level(value: f64) -> String {
    if value.is_finite() {
        format!("{:7.2}", value)
    } else if value == f64::NEG_INFINITY {
        format!("{:>7}", "-inf")
    } else {
        format!("{:>7}", "--")
    }
}

/// One status line, e.g. `Direct Left:  -20.00 dBFS   80.00 dBSPL - Right: ...`
pub fn format_status_line(label: &str, levels: &LevelSnapshot) -> String {
    format!(
        "{} Left: {} dBFS {} dBSPL - Right: {} dBFS {} dBSPL",
        label,
        format_level(levels.left_dbfs),
        format_level(levels.left_dbspl),
        format_level(levels.right_dbfs),
        format_level(levels.right_dbspl),
    )
}

/// Log both measurement paths every `interval` until the task is aborted
pub fn spawn_status_reporter(board: Arc<StatusBoard>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let snapshot = board.snapshot();
            log::info!("{}", format_status_line("Direct  ", &snapshot.direct));
            log::info!("{}", format_status_line("External", &snapshot.external));
            log::debug!("[Status] samples={}", snapshot.samples);
        }
    })
}
