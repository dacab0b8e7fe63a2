//! Submission entry point.
//!
//! Every submission, first attempt or retry, goes through `Submitter::submit`:
//! admitted payloads are handed to the transport, rejected ones are parked in
//! the retry queue with the wait the window reported.

use crate::application::metrics::Metrics;
use crate::application::ports::Transport;
use crate::application::rate_window::RateWindow;
use crate::application::retry_queue::RetryQueue;
use crate::domain::window::AdmitDecision;
use crate::domain::work_item::WorkItem;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Admits, delivers or defers submissions.
///
/// `submit` never blocks beyond the admission check and never reports rate
/// limiting to the caller. Delivery runs as a task on the captured runtime,
/// outside the admission lock, so sends to the transport may overlap.
pub struct Submitter<P, T> {
    window: RateWindow,
    queue: Arc<RetryQueue<P>>,
    transport: Arc<T>,
    metrics: Metrics,
    runtime: Handle,
}

impl<P, T> Submitter<P, T>
where
    P: Send + Sync + 'static,
    T: Transport<P>,
{
    /// Create a new submitter.
    ///
    /// # Arguments
    /// * `window` - Admission window shared by first attempts and retries
    /// * `queue` - Where rejected submissions wait
    /// * `transport` - Delivers admitted payloads
    /// * `metrics` - Outcome counters
    /// * `runtime` - Runtime that delivery tasks are spawned on
    pub fn new(
        window: RateWindow,
        queue: Arc<RetryQueue<P>>,
        transport: Arc<T>,
        metrics: Metrics,
        runtime: Handle,
    ) -> Self {
        Self {
            window,
            queue,
            transport,
            metrics,
            runtime,
        }
    }

    /// Submit a payload for delivery.
    ///
    /// Admitted payloads are delivered exactly once. Rejected payloads are
    /// queued with `not_before = now + wait` and resubmitted later by the
    /// dispatcher. If the queue is closed, the payload is dropped and counted.
    pub fn submit(&self, payload: P, credential: impl Into<String>) {
        let credential = credential.into();
        let (decision, now) = self.window.try_admit_at_now();

        match decision {
            AdmitDecision::Admitted => {
                self.metrics.record_admitted();
                debug!("submission admitted");
                self.deliver(payload, credential);
            }
            AdmitDecision::Rejected { wait } => {
                let item = WorkItem::new(payload, credential, now + wait);
                match self.queue.push(item) {
                    Ok(()) => {
                        self.metrics.record_deferred();
                        debug!(
                            wait_ms = wait.as_millis() as u64,
                            pending = self.queue.len(),
                            "rate limit reached, submission deferred"
                        );
                    }
                    Err(_) => {
                        self.metrics.record_dropped(1);
                        warn!("dispatcher stopped, dropping deferred submission");
                    }
                }
            }
        }
    }

    fn deliver(&self, payload: P, credential: String) {
        let transport = Arc::clone(&self.transport);
        let metrics = self.metrics.clone();

        self.runtime.spawn(async move {
            if let Err(e) = transport.send(&payload, &credential).await {
                metrics.record_transport_failure();
                warn!(error = %e, "delivery failed, submission will not be retried");
            }
        });
    }
}

impl<P, T> Submitter<P, T> {
    /// The admission window.
    pub fn window(&self) -> &RateWindow {
        &self.window
    }

    /// The retry queue.
    pub fn queue(&self) -> &Arc<RetryQueue<P>> {
        &self.queue
    }

    /// The transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Outcome counters.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

impl<P, T: fmt::Debug> fmt::Debug for Submitter<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("window", &self.window)
            .field("pending", &self.queue.len())
            .field("transport", &self.transport)
            .field("metrics", &self.metrics)
            .finish()
    }
}
