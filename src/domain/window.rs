//! Sliding admission window.
//!
//! This module holds the pure admission algorithm: a rolling window that
//! remembers when each admitted operation stops occupying capacity. It knows
//! nothing about locks or clocks; callers pass the current instant in.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Decision made by the admission window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitDecision {
    /// A slot was reserved for this operation
    Admitted,
    /// The window is full; the earliest slot frees up after `wait`
    Rejected {
        /// Time until capacity is available again
        wait: Duration,
    },
}

impl AdmitDecision {
    /// Check if this decision is `Admitted`.
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmitDecision::Admitted)
    }

    /// Check if this decision is `Rejected`.
    pub fn is_rejected(&self) -> bool {
        matches!(self, AdmitDecision::Rejected { .. })
    }

    /// The wait carried by a rejection, if any.
    pub fn wait(&self) -> Option<Duration> {
        match self {
            AdmitDecision::Admitted => None,
            AdmitDecision::Rejected { wait } => Some(*wait),
        }
    }
}

/// Unit of time used as the window length.
///
/// One unit is one window: `TimeUnit::Second` with a limit of 10 means
/// "at most 10 admissions in any rolling second".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// One millisecond
    Millisecond,
    /// One second
    Second,
    /// One minute
    Minute,
    /// One hour
    Hour,
    /// One day
    Day,
}

impl TimeUnit {
    /// Duration of a single unit.
    pub fn as_duration(self) -> Duration {
        match self {
            TimeUnit::Millisecond => Duration::from_millis(1),
            TimeUnit::Second => Duration::from_secs(1),
            TimeUnit::Minute => Duration::from_secs(60),
            TimeUnit::Hour => Duration::from_secs(60 * 60),
            TimeUnit::Day => Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl From<TimeUnit> for Duration {
    fn from(unit: TimeUnit) -> Self {
        unit.as_duration()
    }
}

/// Shortest window an `AdmissionWindow` will use.
///
/// A zero window would admit without bound and reject with a zero wait.
pub const MIN_WINDOW: Duration = Duration::from_millis(1);

/// Rolling admission window.
///
/// Stores one expiry instant per outstanding admission, oldest first. An
/// admission at `t` occupies capacity until `t + window`, independent of any
/// bucket boundary.
///
/// A limit of zero is a permanent-rejection configuration: nothing is ever
/// admitted and every rejection carries the full window as its wait, so a
/// retry loop driven by it advances at the window's cadence instead of
/// spinning.
///
/// # Example
/// ```
/// use submit_throttle::AdmissionWindow;
/// use std::time::{Duration, Instant};
///
/// let mut window = AdmissionWindow::new(2, Duration::from_secs(1));
/// let now = Instant::now();
///
/// assert!(window.try_admit(now).is_admitted());
/// assert!(window.try_admit(now).is_admitted());
///
/// // Full: the wait is the time until the oldest admission expires
/// let later = now + Duration::from_millis(400);
/// assert_eq!(window.try_admit(later).wait(), Some(Duration::from_millis(600)));
///
/// // Once the first slot expires, capacity returns
/// assert!(window.try_admit(now + Duration::from_secs(1)).is_admitted());
/// ```
#[derive(Debug, Clone)]
pub struct AdmissionWindow {
    limit: usize,
    window: Duration,
    expiries: VecDeque<Instant>,
}

impl AdmissionWindow {
    /// Create a new admission window.
    ///
    /// # Arguments
    /// * `limit` - Maximum admissions outstanding within one window
    /// * `window` - Length of the rolling window, raised to [`MIN_WINDOW`]
    ///   if shorter
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window: window.max(MIN_WINDOW),
            expiries: VecDeque::with_capacity(limit),
        }
    }

    /// Drop every admission whose window has elapsed at `now`.
    fn purge_expired(&mut self, now: Instant) {
        while let Some(&expiry) = self.expiries.front() {
            if expiry <= now {
                self.expiries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Attempt to reserve a slot at `now`.
    pub fn try_admit(&mut self, now: Instant) -> AdmitDecision {
        self.purge_expired(now);

        if self.expiries.len() < self.limit {
            self.expiries.push_back(now + self.window);
            return AdmitDecision::Admitted;
        }

        // Expiries are pushed in non-decreasing order, so the head frees first.
        // After the purge every remaining expiry is strictly after `now`.
        let wait = match self.expiries.front() {
            Some(&earliest) => earliest.saturating_duration_since(now),
            None => self.window,
        };
        AdmitDecision::Rejected { wait }
    }

    /// Number of admissions still occupying the window at `now`.
    pub fn outstanding(&mut self, now: Instant) -> usize {
        self.purge_expired(now);
        self.expiries.len()
    }

    /// Number of stored expiries, without purging.
    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    /// Check if no admission is stored.
    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }

    /// Maximum admissions per window.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Length of the rolling window.
    pub fn window(&self) -> Duration {
        self.window
    }
}
