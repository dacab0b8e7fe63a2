//! # submit-throttle
//!
//! Client-side admission control that never fails the caller for going too fast.
//!
//! A `ThrottledClient` admits at most `request_limit` submissions in any rolling
//! window. Submissions over the limit are not rejected: they are parked in a
//! time-ordered retry queue and a background dispatcher resubmits each one as
//! soon as the window has room again.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use submit_throttle::{Document, DocumentClient, TimeUnit};
//!
//! #[tokio::main]
//! async fn main() {
//!     // At most 10 documents per rolling second
//!     let client = DocumentClient::new(TimeUnit::Second, 10).unwrap();
//!
//!     for _ in 0..25 {
//!         // Never blocks, never errors: 10 go out now, 15 are retried later
//!         client.create_document(Document::default(), "signature");
//!     }
//!
//!     // Stop the dispatcher (pending retries are dropped)
//!     client.shutdown().await.expect("shutdown failed");
//! }
//! ```
//!
//! ## How Admission Works
//!
//! The window stores one expiry per admitted submission. An admission at `t`
//! occupies a slot until `t + window`, so the limit holds over *every*
//! window-long interval, not only over fixed buckets:
//!
//! ```text
//! limit = 2, window = 1000ms
//!
//! t=0      A admitted        slots: [A→1000]
//! t=900    B admitted        slots: [A→1000, B→1900]
//! t=950    C rejected        wait = 1000 - 950 = 50ms, queued for t=1000
//! t=1000   A expires, C retried and admitted
//!                            slots: [B→1900, C→2000]
//! ```
//!
//! A rejection carries the time until the oldest slot frees up. The
//! submission is queued with that `not_before` instant; the dispatcher sleeps
//! until the earliest one is due and sends it back through the same admission
//! path. A retry that loses the race for the freed slot is simply queued again
//! with a fresh wait.
//!
//! ## Delivery
//!
//! Admitted payloads go to a [`Transport`]. The built-in [`HttpTransport`]
//! (feature `http`, enabled by default) posts the payload as JSON with the
//! credential in the `Authorization` header. Any other delivery mechanism can
//! be plugged in by implementing the trait:
//!
//! ```rust,no_run
//! use submit_throttle::{ThrottledClient, TimeUnit, Transport, TransportError};
//!
//! #[derive(Debug)]
//! struct Stdout;
//!
//! impl Transport<String> for Stdout {
//!     async fn send(&self, payload: &String, _credential: &str) -> Result<(), TransportError> {
//!         println!("{payload}");
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() {
//! let client = ThrottledClient::builder(TimeUnit::Minute, 60, Stdout)
//!     .build()
//!     .unwrap();
//! client.submit("hello".to_string(), "token");
//! # }
//! ```
//!
//! Delivery failures are logged at `WARN` and counted in
//! [`Metrics::transport_failures`], but never retried: the throttle retries
//! for capacity, not for delivery.
//!
//! ## Shutdown
//!
//! The dispatcher runs until [`ThrottledClient::shutdown`] is awaited or the
//! last clone of the client is dropped. Deferred submissions still waiting at
//! that point are dropped and counted in [`Metrics::dropped`]. There is no way
//! to cancel a single deferred submission.
//!
//! ## Observability
//!
//! ```rust,no_run
//! # use submit_throttle::{DocumentClient, TimeUnit};
//! # async fn example() {
//! # let client = DocumentClient::new(TimeUnit::Second, 10).unwrap();
//! let snapshot = client.metrics().snapshot();
//! println!("admitted: {}", snapshot.admitted);
//! println!("deferred: {}", snapshot.deferred);
//! println!("rejection rate: {:.2}%", snapshot.rejection_rate() * 100.0);
//! println!("waiting for retry: {}", client.pending());
//! # }
//! ```
//!
//! ## Known Limits
//!
//! - The retry queue is unbounded. If submissions keep outpacing the limit,
//!   it grows without bound.
//! - A request limit of zero admits nothing. The builder refuses it unless
//!   `allow_zero_limit()` is called, in which case every submission is
//!   deferred one window at a time until shutdown.
//! - Pending work is not persisted across restarts.

// Domain layer - pure logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    document::{Description, Document, Product},
    window::{AdmissionWindow, AdmitDecision, TimeUnit},
    work_item::WorkItem,
};

pub use application::{
    dispatcher::{Dispatcher, DispatcherHandle, ShutdownError},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, Transport, TransportError},
    rate_window::RateWindow,
    retry_queue::RetryQueue,
    submitter::Submitter,
};

pub use infrastructure::{
    client::{BuildError, ThrottledClient, ThrottledClientBuilder},
    clock::SystemClock,
    config::ThrottleConfig,
};

#[cfg(feature = "http")]
pub use infrastructure::{
    client::DocumentClient,
    http::{HttpTransport, HttpTransportConfig},
};
