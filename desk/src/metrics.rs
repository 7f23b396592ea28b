//! Metrics collection for desk monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Desk metrics.
pub struct DeskMetrics {
    /// Rates locked for a dialogue.
    pub quotes_issued: AtomicU64,
    /// Quote or rate board requests that could not get rates.
    pub quote_failures: AtomicU64,
    /// Amounts priced to completion.
    pub conversions_completed: AtomicU64,
    /// Amounts rejected by validation.
    pub validation_failures: AtomicU64,
    /// Explicit resets.
    pub session_resets: AtomicU64,
    /// Sessions cleared because of an out-of-order event.
    pub integrity_failures: AtomicU64,
    /// Free text received with no conversion in progress.
    pub stray_messages: AtomicU64,
    /// Sessions dropped by the idle sweep.
    pub sessions_evicted: AtomicU64,
}

impl DeskMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            quotes_issued: AtomicU64::new(0),
            quote_failures: AtomicU64::new(0),
            conversions_completed: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            session_resets: AtomicU64::new(0),
            integrity_failures: AtomicU64::new(0),
            stray_messages: AtomicU64::new(0),
            sessions_evicted: AtomicU64::new(0),
        }
    }

    /// Record a locked quote.
    pub fn quote_issued(&self) {
        self.quotes_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed rate request.
    pub fn quote_failed(&self) {
        self.quote_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed conversion.
    pub fn conversion_completed(&self) {
        self.conversions_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected amount.
    pub fn validation_failed(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reset.
    pub fn session_reset(&self) {
        self.session_resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session integrity failure.
    pub fn integrity_failed(&self) {
        self.integrity_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record text that arrived outside a conversion.
    pub fn stray_message(&self) {
        self.stray_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Record sessions removed by the sweep.
    pub fn record_evictions(&self, count: usize) {
        self.sessions_evicted.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            quotes_issued: self.quotes_issued.load(Ordering::Relaxed),
            quote_failures: self.quote_failures.load(Ordering::Relaxed),
            conversions_completed: self.conversions_completed.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            session_resets: self.session_resets.load(Ordering::Relaxed),
            integrity_failures: self.integrity_failures.load(Ordering::Relaxed),
            stray_messages: self.stray_messages.load(Ordering::Relaxed),
            sessions_evicted: self.sessions_evicted.load(Ordering::Relaxed),
        }
    }
}

impl Default for DeskMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub quotes_issued: u64,
    pub quote_failures: u64,
    pub conversions_completed: u64,
    pub validation_failures: u64,
    pub session_resets: u64,
    pub integrity_failures: u64,
    pub stray_messages: u64,
    pub sessions_evicted: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<DeskMetrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = DeskMetrics::new();

        metrics.quote_issued();
        metrics.quote_issued();
        metrics.conversion_completed();
        metrics.record_evictions(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.quotes_issued, 2);
        assert_eq!(snapshot.conversions_completed, 1);
        assert_eq!(snapshot.sessions_evicted, 3);
        assert_eq!(snapshot.quote_failures, 0);
    }
}
