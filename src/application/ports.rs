//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use std::fmt::{self, Debug};
use std::future::Future;
use std::time::Instant;

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Error reported by a transport when delivery fails.
///
/// Transport failures are logged and dropped by the submitter; they are never
/// retried and never reach the caller of `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The payload could not be serialized
    Serialize(String),
    /// The request could not be sent or no response was received
    Request(String),
    /// The endpoint answered with a non-success status
    Status {
        /// HTTP status code
        code: u16,
        /// Response body, if readable
        body: String,
    },
    /// Any other transport-specific failure
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Serialize(e) => write!(f, "failed to serialize payload: {}", e),
            TransportError::Request(e) => write!(f, "request failed: {}", e),
            TransportError::Status { code, body } => {
                write!(f, "endpoint returned status {}: {}", code, body)
            }
            TransportError::Other(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

/// Port for delivering an admitted payload.
///
/// The submitter hands every admitted `(payload, credential)` pair to the
/// transport exactly once. Implementations own serialization and the network
/// call; the throttle only observes success or failure.
pub trait Transport<P>: Send + Sync + Debug + 'static {
    /// Deliver a payload, authenticating with `credential`.
    fn send(
        &self,
        payload: &P,
        credential: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
