//! The assembled throttled client.
//!
//! Wires a rate window, retry queue, submitter and dispatcher together behind
//! a builder, and owns the dispatcher for as long as any clone of the client
//! is alive.

use crate::application::{
    dispatcher::{Dispatcher, DispatcherHandle, ShutdownError},
    metrics::Metrics,
    ports::{Clock, Transport, TransportError},
    rate_window::RateWindow,
    retry_queue::RetryQueue,
    submitter::Submitter,
};
use crate::domain::document::Document;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::ThrottleConfig;

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::warn;

#[cfg(feature = "http")]
use crate::infrastructure::http::HttpTransport;

/// Error returned when building a `ThrottledClient` fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The time unit (window length) must be greater than zero
    ZeroTimeUnit,
    /// The request limit must be greater than zero unless explicitly allowed
    ZeroRequestLimit,
    /// No runtime was given and none is running on the building thread
    NoRuntime,
    /// The transport could not be constructed
    Transport(TransportError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::ZeroTimeUnit => write!(f, "time unit must be greater than 0"),
            BuildError::ZeroRequestLimit => write!(
                f,
                "request limit must be greater than 0 (use allow_zero_limit() to reject everything)"
            ),
            BuildError::NoRuntime => write!(
                f,
                "no tokio runtime available; build inside a runtime or call with_runtime()"
            ),
            BuildError::Transport(e) => write!(f, "unable to create transport: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for BuildError {
    fn from(e: TransportError) -> Self {
        BuildError::Transport(e)
    }
}

/// Builder for constructing a `ThrottledClient`.
pub struct ThrottledClientBuilder<P, T> {
    window: Duration,
    request_limit: usize,
    transport: T,
    clock: Option<Arc<dyn Clock>>,
    runtime: Option<Handle>,
    allow_zero_limit: bool,
    _payload: PhantomData<fn(P)>,
}

impl<P, T> ThrottledClientBuilder<P, T>
where
    P: Send + Sync + 'static,
    T: Transport<P>,
{
    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Run delivery and dispatch tasks on `runtime`.
    ///
    /// Without this, `build()` uses the runtime it is called from.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Accept a request limit of zero.
    ///
    /// A zero limit never admits anything: every submission is deferred by
    /// one full window, again and again, until the client shuts down.
    pub fn allow_zero_limit(mut self) -> Self {
        self.allow_zero_limit = true;
        self
    }

    /// Build the client and start its dispatcher.
    ///
    /// # Errors
    /// Returns an error if the time unit is zero, the request limit is zero
    /// without `allow_zero_limit()`, or no runtime is available.
    pub fn build(self) -> Result<ThrottledClient<P, T>, BuildError> {
        if self.window.is_zero() {
            return Err(BuildError::ZeroTimeUnit);
        }
        if self.request_limit == 0 {
            if !self.allow_zero_limit {
                return Err(BuildError::ZeroRequestLimit);
            }
            warn!("request limit is zero, every submission will be deferred indefinitely");
        }

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| BuildError::NoRuntime)?,
        };
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()));

        let window = RateWindow::new(self.request_limit, self.window, Arc::clone(&clock));
        let queue = Arc::new(RetryQueue::new(clock));
        let submitter = Arc::new(Submitter::new(
            window,
            queue,
            Arc::new(self.transport),
            Metrics::new(),
            runtime.clone(),
        ));

        let handle = Dispatcher::new(Arc::clone(&submitter)).start(&runtime);

        Ok(ThrottledClient {
            submitter,
            dispatcher: Arc::new(Mutex::new(Some(handle))),
        })
    }
}

/// Rate-limited client that defers and retries instead of failing.
///
/// At most `request_limit` submissions are admitted in any rolling window.
/// Submissions over the limit are queued and resubmitted by a background
/// dispatcher once capacity frees up; callers never see a rate-limit error.
///
/// Clones share the same window, queue and dispatcher. The dispatcher stops
/// when [`shutdown`](ThrottledClient::shutdown) is called or when the last
/// clone is dropped.
///
/// # Example
///
/// ```no_run
/// use submit_throttle::{Document, DocumentClient, TimeUnit};
///
/// # async fn example() {
/// let client = DocumentClient::new(TimeUnit::Second, 10).unwrap();
///
/// client.create_document(Document::default(), "signature");
///
/// client.shutdown().await.expect("shutdown failed");
/// # }
/// ```
pub struct ThrottledClient<P, T> {
    submitter: Arc<Submitter<P, T>>,
    dispatcher: Arc<Mutex<Option<DispatcherHandle>>>,
}

impl<P, T> ThrottledClient<P, T>
where
    P: Send + Sync + 'static,
    T: Transport<P>,
{
    /// Create a builder.
    ///
    /// # Arguments
    /// * `time_unit` - Window length, e.g. `TimeUnit::Second` or a `Duration`
    /// * `request_limit` - Maximum admissions per window
    /// * `transport` - Delivers admitted payloads
    pub fn builder(
        time_unit: impl Into<Duration>,
        request_limit: usize,
        transport: T,
    ) -> ThrottledClientBuilder<P, T> {
        ThrottledClientBuilder {
            window: time_unit.into(),
            request_limit,
            transport,
            clock: None,
            runtime: None,
            allow_zero_limit: false,
            _payload: PhantomData,
        }
    }

    /// Create a builder from loaded configuration.
    pub fn from_config(config: ThrottleConfig, transport: T) -> ThrottledClientBuilder<P, T> {
        Self::builder(config.window(), config.request_limit, transport)
    }

    /// Submit a payload.
    ///
    /// Returns immediately after the admission check. The payload is either
    /// handed to the transport now or deferred until the window has room.
    pub fn submit(&self, payload: P, credential: impl Into<String>) {
        self.submitter.submit(payload, credential);
    }

    /// Stop the dispatcher and wait for it.
    ///
    /// Deferred submissions still pending are dropped. Later rejections are
    /// dropped too; admissions keep being delivered. Calling this more than
    /// once is harmless.
    ///
    /// # Errors
    /// Returns an error if the dispatcher task panicked or was cancelled.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        // Take the handle while holding the lock, then release it before awaiting
        let handle = {
            let mut guard = self
                .dispatcher
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.take()
        };

        if let Some(handle) = handle {
            handle.shutdown().await?;
        }
        Ok(())
    }
}

impl<P, T> ThrottledClient<P, T> {
    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        self.submitter.metrics()
    }

    /// Number of deferred submissions waiting for redelivery.
    pub fn pending(&self) -> usize {
        self.submitter.queue().len()
    }

    /// Number of admissions currently occupying the window.
    pub fn in_window(&self) -> usize {
        self.submitter.window().len()
    }

    /// Maximum admissions per window.
    pub fn request_limit(&self) -> usize {
        self.submitter.window().limit()
    }

    /// Length of the rolling window.
    pub fn window(&self) -> Duration {
        self.submitter.window().window()
    }

    /// The transport admitted payloads are handed to.
    pub fn transport(&self) -> &Arc<T> {
        self.submitter.transport()
    }

    /// Check if the dispatcher is still running.
    pub fn is_running(&self) -> bool {
        self.dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl<T> ThrottledClient<Document, T>
where
    T: Transport<Document>,
{
    /// Submit a document for creation, signed with `sign`.
    pub fn create_document(&self, document: Document, sign: impl Into<String>) {
        self.submit(document, sign);
    }
}

/// Client posting documents over HTTP.
#[cfg(feature = "http")]
pub type DocumentClient = ThrottledClient<Document, HttpTransport>;

#[cfg(feature = "http")]
impl ThrottledClient<Document, HttpTransport> {
    /// Create a document client for the default endpoint, allowing
    /// `request_limit` requests per `time_unit`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the limits are invalid, no runtime is running or
    /// the HTTP client cannot be built.
    pub fn new(time_unit: impl Into<Duration>, request_limit: usize) -> Result<Self, BuildError> {
        let transport = HttpTransport::new()?;
        Self::builder(time_unit, request_limit, transport).build()
    }
}

impl<P, T> Clone for ThrottledClient<P, T> {
    fn clone(&self) -> Self {
        Self {
            submitter: Arc::clone(&self.submitter),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<P, T: fmt::Debug> fmt::Debug for ThrottledClient<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottledClient")
            .field("submitter", &self.submitter)
            .field("running", &self.is_running())
            .finish()
    }
}
