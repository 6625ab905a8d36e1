//! Monotonic-tick priority queue of timed callbacks.
//!
//! Used for block-wise/Echo-cache expiry, replay-record aging, and CoAP
//! retransmit back-off. The loop polls [`TimerQueue::poll_due`] between
//! event dispatches and invokes each due callback; a callback's return
//! value decides whether it is removed or re-armed at its original period.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Opaque handle to a scheduled callback, used for cancellation. Stands in
/// for the C source's `(callback-pointer, data-pointer)` tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What a due callback wants the queue to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Remove this callback; it will not fire again.
    Done,
    /// Re-arm this callback at its original period from now.
    Continue,
}

struct Entry {
    id: TimerId,
    due: Instant,
    period: Duration,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due
    }
}
impl Eq for Entry {}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due.cmp(&other.due)
    }
}

/// A priority queue of timed callbacks keyed on monotonic instants.
///
/// Entries are identified by [`TimerId`] alone; the queue does not store the
/// callback closures themselves (that would force a single concrete
/// callback type). Instead, [`TimerQueue::poll_due`] drains and returns the
/// ids whose deadline has passed; the caller matches ids back to whatever
/// per-id work it is tracking and decides the [`CallbackOutcome`].
pub struct TimerQueue {
    heap: Mutex<BinaryHeap<Reverse<Entry>>>,
    next_id: AtomicU64,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Schedule a callback to fire after `period` (and, if continued,
    /// every `period` thereafter).
    pub fn schedule(&self, period: Duration) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.insert(id, Instant::now() + period, period);
        id
    }

    fn insert(&self, id: TimerId, due: Instant, period: Duration) {
        self.heap
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(Reverse(Entry { id, due, period }));
    }

    /// Cancel a scheduled callback by id. A no-op if it already fired and
    /// was not continued, or never existed.
    pub fn cancel(&self, id: TimerId) {
        let mut heap = self
            .heap
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        heap.retain(|Reverse(e)| e.id != id);
    }

    /// Pop every entry whose deadline has passed as of `now`, removing it
    /// from the queue. Returns `(id, period)` pairs; the caller re-arms by
    /// calling [`TimerQueue::rearm`] for any it wants to continue.
    pub fn poll_due(&self, now: Instant) -> Vec<(TimerId, Duration)> {
        let mut heap = self
            .heap
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = heap.peek() {
            if entry.due > now {
                break;
            }
            // SAFETY-free: we just confirmed a non-empty peek above.
            let Reverse(entry) = heap.pop().expect("peeked entry exists");
            due.push((entry.id, entry.period));
        }
        due
    }

    /// Re-arm a callback at its original period, measured from `now`.
    pub fn rearm(&self, id: TimerId, period: Duration, now: Instant) {
        self.insert(id, now + period, period);
    }

    pub fn is_empty(&self) -> bool {
        self.heap
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}
