//! Background redelivery of deferred submissions.
//!
//! The dispatcher is a single tokio task that takes work items off the retry
//! queue as they become ready and feeds them back through the submitter. It
//! runs until its handle requests shutdown or is dropped.

use crate::application::ports::Transport;
use crate::application::retry_queue::RetryQueue;
use crate::application::submitter::Submitter;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, trace, warn};

/// Error returned when the dispatcher task does not stop cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownError {
    /// The dispatcher task panicked
    TaskPanicked,
    /// The dispatcher task was cancelled, usually because its runtime shut down
    TaskCancelled,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownError::TaskPanicked => write!(f, "dispatcher task panicked"),
            ShutdownError::TaskCancelled => write!(f, "dispatcher task was cancelled"),
        }
    }
}

impl std::error::Error for ShutdownError {}

/// Resubmits deferred work items in `not_before` order.
pub struct Dispatcher<P, T> {
    submitter: Arc<Submitter<P, T>>,
    queue: Arc<RetryQueue<P>>,
}

impl<P, T> Dispatcher<P, T>
where
    P: Send + Sync + 'static,
    T: Transport<P>,
{
    /// Create a dispatcher draining the submitter's own retry queue.
    pub fn new(submitter: Arc<Submitter<P, T>>) -> Self {
        let queue = Arc::clone(submitter.queue());
        Self { submitter, queue }
    }

    /// Spawn the dispatch loop on `runtime`.
    ///
    /// The loop waits for either the next ready item or a shutdown request.
    /// A ready item is resubmitted, which may defer it again with a fresh
    /// wait. On shutdown the queue is closed and anything still pending is
    /// dropped and counted.
    pub fn start(self, runtime: &Handle) -> DispatcherHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let Dispatcher { submitter, queue } = self;

        let join = runtime.spawn(async move {
            info!("retry dispatcher started");

            loop {
                tokio::select! {
                    biased;
                    // Resolves on an explicit request or when the handle is dropped.
                    _ = &mut shutdown_rx => break,
                    item = queue.take() => {
                        submitter.metrics().record_retry_dispatched();
                        trace!(pending = queue.len(), "resubmitting deferred work item");
                        let (payload, credential) = item.into_parts();
                        submitter.submit(payload, credential);
                    }
                }
            }

            let abandoned = queue.close();
            if !abandoned.is_empty() {
                submitter.metrics().record_dropped(abandoned.len() as u64);
                warn!(
                    abandoned = abandoned.len(),
                    "retry dispatcher stopped with deferred submissions pending"
                );
            }
            info!("retry dispatcher stopped");
        });

        DispatcherHandle {
            shutdown_tx: Some(shutdown_tx),
            join,
        }
    }
}

/// Handle to a running dispatcher.
///
/// Call [`shutdown`](DispatcherHandle::shutdown) to stop the dispatcher and
/// wait for it. Dropping the handle also stops the dispatcher, without
/// waiting.
#[derive(Debug)]
pub struct DispatcherHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Stop the dispatcher and wait for its task to finish.
    ///
    /// Pending work items are not delivered.
    ///
    /// # Errors
    /// Returns an error if the task panicked or was cancelled.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        let DispatcherHandle { shutdown_tx, join } = self;

        if let Some(tx) = shutdown_tx {
            // The task may already be gone; joining reports why.
            let _ = tx.send(());
        }

        join.await.map_err(|e| {
            if e.is_panic() {
                ShutdownError::TaskPanicked
            } else {
                ShutdownError::TaskCancelled
            }
        })
    }

    /// Check if the dispatcher task has finished.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::metrics::Metrics;
    use crate::application::rate_window::RateWindow;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::mocks::RecordingTransport;
    use std::time::{Duration, Instant};

    fn submitter(
        limit: usize,
        window: Duration,
        transport: RecordingTransport<u32>,
    ) -> Arc<Submitter<u32, RecordingTransport<u32>>> {
        let clock = Arc::new(SystemClock::new());
        Arc::new(Submitter::new(
            RateWindow::new(limit, window, clock.clone()),
            Arc::new(RetryQueue::new(clock)),
            Arc::new(transport),
            Metrics::new(),
            Handle::current(),
        ))
    }

    #[tokio::test]
    async fn test_deferred_item_is_redelivered_after_wait() {
        let transport = RecordingTransport::new();
        let submitter = submitter(1, Duration::from_millis(100), transport.clone());
        let handle = Dispatcher::new(Arc::clone(&submitter)).start(&Handle::current());

        let start = Instant::now();
        submitter.submit(1, "s");
        submitter.submit(2, "s");

        assert!(transport.wait_for(2, Duration::from_secs(2)).await);
        let deliveries = transport.deliveries();
        assert_eq!(deliveries[1].payload, 2);
        assert!(deliveries[1].at >= start + Duration::from_millis(100));
        assert_eq!(submitter.metrics().retries_dispatched(), 1);

        handle.shutdown().await.expect("shutdown failed");
    }

    #[tokio::test]
    async fn test_shutdown_abandons_pending_items() {
        let transport = RecordingTransport::new();
        let submitter = submitter(1, Duration::from_secs(60), transport.clone());
        let handle = Dispatcher::new(Arc::clone(&submitter)).start(&Handle::current());

        for i in 0..4 {
            submitter.submit(i, "s");
        }
        assert_eq!(submitter.queue().len(), 3);

        handle.shutdown().await.expect("shutdown failed");

        assert!(submitter.queue().is_closed());
        assert_eq!(submitter.metrics().dropped(), 3);
        assert_eq!(submitter.metrics().retries_dispatched(), 0);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_dispatcher() {
        let transport = RecordingTransport::new();
        let submitter = submitter(1, Duration::from_secs(60), transport);
        let handle = Dispatcher::new(Arc::clone(&submitter)).start(&Handle::current());

        drop(handle);

        let deadline = Instant::now() + Duration::from_secs(2);
        while !submitter.queue().is_closed() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(submitter.queue().is_closed());
    }

    #[test]
    fn test_shutdown_error_display() {
        assert_eq!(
            ShutdownError::TaskPanicked.to_string(),
            "dispatcher task panicked"
        );
        assert_eq!(
            ShutdownError::TaskCancelled.to_string(),
            "dispatcher task was cancelled"
        );
    }
}
