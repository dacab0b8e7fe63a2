//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Rate window (thread-safe admission checks)
//! - Retry queue (deferred work ordered by ready time)
//! - Submitter (admit, deliver or defer)
//! - Dispatcher (background redelivery)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod dispatcher;
pub mod metrics;
pub mod ports;
pub mod rate_window;
pub mod retry_queue;
pub mod submitter;
