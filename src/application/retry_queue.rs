//! Time-ordered queue of deferred submissions.
//!
//! A min-heap keyed by `(not_before, insertion sequence)` behind a mutex, with
//! a `Notify` so a waiting taker wakes as soon as an earlier item arrives.

use crate::application::ports::Clock;
use crate::domain::work_item::WorkItem;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::Notify;

/// Heap entry: orders by ready time, then by insertion.
#[derive(Debug)]
struct Scheduled<P> {
    not_before: Instant,
    seq: u64,
    item: WorkItem<P>,
}

impl<P> PartialEq for Scheduled<P> {
    fn eq(&self, other: &Self) -> bool {
        self.not_before == other.not_before && self.seq == other.seq
    }
}

impl<P> Eq for Scheduled<P> {}

impl<P> PartialOrd for Scheduled<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for Scheduled<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.not_before
            .cmp(&other.not_before)
            .then(self.seq.cmp(&other.seq))
    }
}

#[derive(Debug)]
struct QueueState<P> {
    heap: BinaryHeap<Reverse<Scheduled<P>>>,
    next_seq: u64,
    closed: bool,
}

/// Result of peeking at the head of the queue.
enum Head<P> {
    Ready(WorkItem<P>),
    NotBefore(Instant),
    Empty,
}

/// Unbounded queue of work items ordered by their `not_before` instant.
///
/// Any number of producers may `push` concurrently; one consumer awaits
/// `take`. Items with equal `not_before` come out in insertion order.
///
/// No backpressure is applied: if rejections outpace capacity for long
/// enough, the queue grows without bound.
#[derive(Debug)]
pub struct RetryQueue<P> {
    state: Mutex<QueueState<P>>,
    notify: Notify,
    clock: Arc<dyn Clock>,
}

impl<P> RetryQueue<P> {
    /// Create an empty queue reading readiness from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                next_seq: 0,
                closed: false,
            }),
            notify: Notify::new(),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<P>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a work item.
    ///
    /// # Errors
    /// Returns the item back if the queue has been closed.
    pub fn push(&self, item: WorkItem<P>) -> Result<(), WorkItem<P>> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(item);
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.heap.push(Reverse(Scheduled {
                not_before: item.not_before(),
                seq,
                item,
            }));
        }
        // Stores a permit if the taker is between checks, so no wakeup is lost.
        self.notify.notify_one();
        Ok(())
    }

    fn head(&self, now: Instant) -> Head<P> {
        let mut state = self.lock();
        let next_at = match state.heap.peek() {
            Some(Reverse(next)) => next.not_before,
            None => return Head::Empty,
        };
        if next_at > now {
            return Head::NotBefore(next_at);
        }
        match state.heap.pop() {
            Some(Reverse(scheduled)) => Head::Ready(scheduled.item),
            None => Head::Empty,
        }
    }

    /// Pop the earliest item if it is ready now.
    pub fn try_take(&self) -> Option<WorkItem<P>> {
        match self.head(self.clock.now()) {
            Head::Ready(item) => Some(item),
            _ => None,
        }
    }

    /// Wait for the earliest item to become ready and pop it.
    ///
    /// Sleeps until the head's `not_before`, waking early when a new item is
    /// pushed so an earlier arrival is not missed. Cancel-safe: dropping the
    /// future never loses an item.
    pub async fn take(&self) -> WorkItem<P> {
        loop {
            let now = self.clock.now();
            match self.head(now) {
                Head::Ready(item) => return item,
                Head::NotBefore(at) => {
                    let wait = at.saturating_duration_since(now);
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        _ = self.notify.notified() => {}
                    }
                }
                Head::Empty => self.notify.notified().await,
            }
        }
    }

    /// Number of items waiting.
    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    /// Check if no item is waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    /// Earliest `not_before` among waiting items.
    pub fn next_ready_at(&self) -> Option<Instant> {
        self.lock().heap.peek().map(|Reverse(next)| next.not_before)
    }

    /// Refuse further pushes and return everything still waiting, earliest
    /// first.
    pub fn close(&self) -> Vec<WorkItem<P>> {
        let mut state = self.lock();
        state.closed = true;
        let mut drained = Vec::with_capacity(state.heap.len());
        while let Some(Reverse(scheduled)) = state.heap.pop() {
            drained.push(scheduled.item);
        }
        drained
    }

    /// Check if the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
