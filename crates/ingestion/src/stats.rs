//! Per-context arrival counters

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ArrivalErrorKind;

/// Arrival counters of one reader context
#[derive(Debug, Default)]
pub struct ContextStats {
    /// Arrival notifications handled
    pub arrivals: AtomicU64,

    /// SensorFrames produced
    pub frames_produced: AtomicU64,

    /// Produced frames whose frame-to-origin transform was unavailable
    pub frames_without_pose: AtomicU64,

    /// No frame to acquire
    pub not_available: AtomicU64,

    /// Frame, video payload or bitmap missing
    pub missing_data: AtomicU64,

    /// Perception timestamp resolution failures
    pub timestamp_failures: AtomicU64,

    /// Collaborator panics caught at the arrival boundary
    pub panics: AtomicU64,
}

impl ContextStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_arrival(&self) {
        self.arrivals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_produced(&self, has_pose: bool) {
        self.frames_produced.fetch_add(1, Ordering::Relaxed);
        if !has_pose {
            self.frames_without_pose.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_skipped(&self, kind: ArrivalErrorKind) {
        let counter = match kind {
            ArrivalErrorKind::NotAvailable => &self.not_available,
            ArrivalErrorKind::MissingData => &self.missing_data,
            ArrivalErrorKind::TimestampResolutionFailure => &self.timestamp_failures,
            ArrivalErrorKind::Panicked => &self.panics,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> ContextStatsSnapshot {
        ContextStatsSnapshot {
            arrivals: self.arrivals.load(Ordering::Relaxed),
            frames_produced: self.frames_produced.load(Ordering::Relaxed),
            frames_without_pose: self.frames_without_pose.load(Ordering::Relaxed),
            not_available: self.not_available.load(Ordering::Relaxed),
            missing_data: self.missing_data.load(Ordering::Relaxed),
            timestamp_failures: self.timestamp_failures.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
        }
    }
}

/// Stats snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStatsSnapshot {
    pub arrivals: u64,
    pub frames_produced: u64,
    pub frames_without_pose: u64,
    pub not_available: u64,
    pub missing_data: u64,
    pub timestamp_failures: u64,
    pub panics: u64,
}

impl ContextStatsSnapshot {
    /// Arrivals that did not produce a frame
    pub fn skipped(&self) -> u64 {
        self.not_available + self.missing_data + self.timestamp_failures + self.panics
    }
}
