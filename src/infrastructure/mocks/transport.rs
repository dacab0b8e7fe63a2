//! Recording transport for testing.

use crate::application::ports::{Transport, TransportError};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// One call to [`RecordingTransport::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Delivery<P> {
    pub payload: P,
    pub credential: String,
    pub at: Instant,
}

/// Transport that records every send instead of performing I/O.
///
/// Clones share the same record. A failing transport still records each
/// attempt, then reports an error.
///
/// # Examples
///
/// ```
/// use submit_throttle::infrastructure::mocks::RecordingTransport;
/// use submit_throttle::Transport;
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let transport = RecordingTransport::new();
///
/// runtime.block_on(transport.send(&"payload", "sign")).unwrap();
/// assert_eq!(transport.count(), 1);
/// assert_eq!(transport.deliveries()[0].credential, "sign");
/// ```
pub struct RecordingTransport<P> {
    deliveries: Arc<Mutex<Vec<Delivery<P>>>>,
    fail: bool,
}

impl<P> RecordingTransport<P> {
    /// Create a transport whose sends succeed.
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// Create a transport whose sends all fail.
    pub fn failing() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// Number of sends so far.
    pub fn count(&self) -> usize {
        self.deliveries
            .lock()
            .expect("RecordingTransport mutex poisoned - a test thread panicked while holding the lock")
            .len()
    }

    /// Wait until at least `count` sends happened, giving up after `timeout`.
    ///
    /// Returns whether the count was reached.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.count() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl<P: Clone> RecordingTransport<P> {
    /// All sends so far, in call order.
    pub fn deliveries(&self) -> Vec<Delivery<P>> {
        self.deliveries
            .lock()
            .expect("RecordingTransport mutex poisoned - a test thread panicked while holding the lock")
            .clone()
    }

    /// Payloads sent so far, in call order.
    pub fn payloads(&self) -> Vec<P> {
        self.deliveries().into_iter().map(|d| d.payload).collect()
    }
}

impl<P> Clone for RecordingTransport<P> {
    fn clone(&self) -> Self {
        Self {
            deliveries: Arc::clone(&self.deliveries),
            fail: self.fail,
        }
    }
}

impl<P> Default for RecordingTransport<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for RecordingTransport<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingTransport")
            .field("count", &self.count())
            .field("fail", &self.fail)
            .finish()
    }
}

impl<P> Transport<P> for RecordingTransport<P>
where
    P: Clone + Send + Sync + 'static,
{
    async fn send(&self, payload: &P, credential: &str) -> Result<(), TransportError> {
        self.deliveries
            .lock()
            .expect("RecordingTransport mutex poisoned - a test thread panicked while holding the lock")
            .push(Delivery {
                payload: payload.clone(),
                credential: credential.to_string(),
                at: Instant::now(),
            });

        if self.fail {
            Err(TransportError::Other("simulated failure".to_string()))
        } else {
            Ok(())
        }
    }
}
