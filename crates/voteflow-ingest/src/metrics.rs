//! Ingestion metrics (lock-free atomic counters).
//!
//! One [`IngestMetrics`] instance is shared between the pipeline and
//! whoever reports on it; reads never block the hot path.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one pipeline instance.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Messages received from the subscription.
    received: AtomicU64,
    /// Records successfully persisted.
    persisted: AtomicU64,
    /// Messages dropped because deserialization failed.
    decode_errors: AtomicU64,
    /// Messages lost because the storage write failed.
    storage_errors: AtomicU64,
}

/// Point-in-time copy of [`IngestMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestMetricsSnapshot {
    /// Messages received from the subscription.
    pub received: u64,
    /// Records successfully persisted.
    pub persisted: u64,
    /// Messages dropped because deserialization failed.
    pub decode_errors: u64,
    /// Messages lost because the storage write failed.
    pub storage_errors: u64,
}

impl IngestMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one inbound message.
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one successful persist.
    pub fn record_persisted(&self) {
        self.persisted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one dropped malformed message.
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one failed storage write.
    pub fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> IngestMetricsSnapshot {
        IngestMetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            storage_errors: self.storage_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot_is_zero() {
        let metrics = IngestMetrics::new();
        let snap = metrics.snapshot();
        assert_eq!(snap.received, 0);
        assert_eq!(snap.persisted, 0);
        assert_eq!(snap.decode_errors, 0);
        assert_eq!(snap.storage_errors, 0);
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = IngestMetrics::new();
        metrics.record_received();
        metrics.record_received();
        metrics.record_persisted();
        metrics.record_decode_error();
        metrics.record_storage_error();

        let snap = metrics.snapshot();
        assert_eq!(snap.received, 2);
        assert_eq!(snap.persisted, 1);
        assert_eq!(snap.decode_errors, 1);
        assert_eq!(snap.storage_errors, 1);
    }
}
