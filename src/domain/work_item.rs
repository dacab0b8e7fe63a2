//! Deferred units of work.

use std::time::Instant;

/// A rejected submission waiting for capacity.
///
/// Holds the payload and credential exactly as they were submitted, plus the
/// earliest instant at which another admission attempt may succeed. Work items
/// are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem<P> {
    payload: P,
    credential: String,
    not_before: Instant,
}

impl<P> WorkItem<P> {
    /// Create a new work item.
    pub fn new(payload: P, credential: impl Into<String>, not_before: Instant) -> Self {
        Self {
            payload,
            credential: credential.into(),
            not_before,
        }
    }

    /// The submitted payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// The credential forwarded to the transport.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Earliest instant at which the item may be retried.
    pub fn not_before(&self) -> Instant {
        self.not_before
    }

    /// Check if the item may be retried at `now`.
    pub fn is_ready(&self, now: Instant) -> bool {
        self.not_before <= now
    }

    /// Consume the item, returning payload and credential.
    pub fn into_parts(self) -> (P, String) {
        (self.payload, self.credential)
    }
}
