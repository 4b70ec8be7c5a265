//! Per-sink delivery counters
//!
//! Local counters back `SinkSet::metrics()`; drops and failures are also
//! reported to the global recorder under the sink's name.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Delivery counters of one sink
#[derive(Debug)]
pub struct SinkMetrics {
    sink_name: String,
    queue_len: AtomicUsize,
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl SinkMetrics {
    pub fn new(sink_name: impl Into<String>) -> Self {
        Self {
            sink_name: sink_name.into(),
            queue_len: AtomicUsize::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    /// Frames waiting in the sink's queue (channel sinks only)
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        observability::record_sink_dropped(&self.sink_name, "write_failed");
    }

    /// Frame not handed over (`queue_full` / `closed`)
    pub fn record_dropped(&self, reason: &'static str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        observability::record_sink_dropped(&self.sink_name, reason);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len.load(Ordering::Relaxed),
            delivered: self.delivered(),
            failed: self.failed(),
            dropped: self.dropped(),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}
