//! Observability metrics for the throttle.
//!
//! Counts what happened to every submission: admitted straight away, deferred
//! to the retry queue, redelivered by the dispatcher, or lost.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking submission outcomes.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Admission attempts that reserved a slot
    admitted: AtomicU64,
    /// Admission attempts rejected and queued for retry
    deferred: AtomicU64,
    /// Work items taken off the retry queue and resubmitted
    retries_dispatched: AtomicU64,
    /// Admitted payloads the transport failed to deliver
    transport_failures: AtomicU64,
    /// Work items discarded because the dispatcher had shut down
    dropped: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deferred(&self) {
        self.inner.deferred.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry_dispatched(&self) {
        self.inner.retries_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transport_failure(&self) {
        self.inner.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self, count: u64) {
        self.inner.dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Get the number of admissions.
    pub fn admitted(&self) -> u64 {
        self.inner.admitted.load(Ordering::Relaxed)
    }

    /// Get the number of deferrals.
    ///
    /// An item rejected twice is counted twice.
    pub fn deferred(&self) -> u64 {
        self.inner.deferred.load(Ordering::Relaxed)
    }

    /// Get the number of retries the dispatcher resubmitted.
    pub fn retries_dispatched(&self) -> u64 {
        self.inner.retries_dispatched.load(Ordering::Relaxed)
    }

    /// Get the number of failed deliveries.
    pub fn transport_failures(&self) -> u64 {
        self.inner.transport_failures.load(Ordering::Relaxed)
    }

    /// Get the number of work items dropped after shutdown.
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            admitted: self.admitted(),
            deferred: self.deferred(),
            retries_dispatched: self.retries_dispatched(),
            transport_failures: self.transport_failures(),
            dropped: self.dropped(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.admitted.store(0, Ordering::Relaxed);
        self.inner.deferred.store(0, Ordering::Relaxed);
        self.inner.retries_dispatched.store(0, Ordering::Relaxed);
        self.inner.transport_failures.store(0, Ordering::Relaxed);
        self.inner.dropped.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Admission attempts that reserved a slot
    pub admitted: u64,
    /// Admission attempts rejected and queued for retry
    pub deferred: u64,
    /// Work items resubmitted by the dispatcher
    pub retries_dispatched: u64,
    /// Admitted payloads the transport failed to deliver
    pub transport_failures: u64,
    /// Work items discarded after shutdown
    pub dropped: u64,
}

impl MetricsSnapshot {
    /// Total admission attempts (admitted + deferred).
    pub fn total_attempts(&self) -> u64 {
        self.admitted.saturating_add(self.deferred)
    }

    /// Ratio of rejected attempts to all attempts (0.0 to 1.0).
    ///
    /// Returns 0.0 if nothing has been attempted.
    pub fn rejection_rate(&self) -> f64 {
        let total = self.total_attempts();
        if total == 0 {
            0.0
        } else {
            self.deferred as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_snapshot() {
        let metrics = Metrics::new();
        metrics.record_admitted();
        metrics.record_admitted();
        metrics.record_deferred();
        metrics.record_retry_dispatched();
        metrics.record_transport_failure();
        metrics.record_dropped(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.admitted, 2);
        assert_eq!(snapshot.deferred, 1);
        assert_eq!(snapshot.retries_dispatched, 1);
        assert_eq!(snapshot.transport_failures, 1);
        assert_eq!(snapshot.dropped, 4);
        assert_eq!(snapshot.total_attempts(), 3);
    }

    #[test]
    fn test_rejection_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().rejection_rate(), 0.0);

        metrics.record_admitted();
        metrics.record_deferred();
        assert!((metrics.snapshot().rejection_rate() - 0.5).abs() < f64::EPSILON);

        metrics.record_deferred();
        metrics.record_deferred();
        assert!((metrics.snapshot().rejection_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_admitted();
        metrics.record_deferred();
        metrics.record_dropped(2);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics1 = Metrics::new();
        let metrics2 = metrics1.clone();

        metrics1.record_admitted();
        metrics2.record_admitted();

        assert_eq!(metrics1.admitted(), 2);
        assert_eq!(metrics2.admitted(), 2);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::thread;

        let metrics = Metrics::new();
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.record_admitted();
                    m.record_deferred();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.admitted(), 1000);
        assert_eq!(metrics.deferred(), 1000);
    }
}
