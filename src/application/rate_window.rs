//! Thread-safe admission check.
//!
//! Wraps the domain `AdmissionWindow` behind a mutex and a clock, exposing a
//! single atomic `try_admit` operation to concurrent callers.

use crate::application::ports::Clock;
use crate::domain::window::{AdmissionWindow, AdmitDecision};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Shared rolling window guarding admissions.
///
/// The lock is held only for the purge, check and insert; no I/O happens
/// while it is held.
#[derive(Debug)]
pub struct RateWindow {
    window: Mutex<AdmissionWindow>,
    clock: Arc<dyn Clock>,
}

impl RateWindow {
    /// Create a new rate window.
    ///
    /// # Arguments
    /// * `limit` - Maximum admissions per window (zero never admits)
    /// * `window` - Length of the rolling window (at least one millisecond)
    /// * `clock` - Time source for admission instants
    pub fn new(limit: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window: Mutex::new(AdmissionWindow::new(limit, window)),
            clock,
        }
    }

    // Every mutation leaves the deque ordered, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, AdmissionWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempt to reserve a slot now.
    pub fn try_admit(&self) -> AdmitDecision {
        self.try_admit_at_now().0
    }

    /// Attempt to reserve a slot, also returning the instant the decision was
    /// taken at.
    ///
    /// The clock is read while the lock is held, so admissions are stamped in
    /// lock order and a caller that waited for the lock is stamped with the
    /// time it actually got in.
    pub(crate) fn try_admit_at_now(&self) -> (AdmitDecision, Instant) {
        let mut window = self.lock();
        let now = self.clock.now();
        (window.try_admit(now), now)
    }

    /// Number of admissions currently occupying the window.
    pub fn len(&self) -> usize {
        let mut window = self.lock();
        let now = self.clock.now();
        window.outstanding(now)
    }

    /// Check if no admission currently occupies the window.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum admissions per window.
    pub fn limit(&self) -> usize {
        self.lock().limit()
    }

    /// Length of the rolling window.
    pub fn window(&self) -> Duration {
        self.lock().window()
    }
}
