//! Monotonic time source for admissions and retry scheduling.
//!
//! Both the rate window and the retry queue stamp and compare `Instant`s
//! taken from a [`Clock`]. `SystemClock` is what a built client uses unless
//! `with_clock()` overrides it; tests swap in `MockClock` from
//! `infrastructure::mocks` (enabled by the `test-helpers` feature).

use crate::application::ports::Clock;
use std::time::Instant;

/// Reads `Instant::now()`.
///
/// Monotonic, so wall-clock adjustments never shorten or stretch a window.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
