//! Deferred-work queue standing in for the GUI toolkit's timer chain.
//!
//! Items are plain data, not callbacks: the owner decides what a fired
//! item means. Everything is drained through `pop_due`, which keeps all
//! state mutation on the caller's single dispatch path and makes delays
//! testable without waiting on a real clock.

/// A pending item and the instant it becomes due.
#[derive(Debug, Clone, PartialEq)]
struct Scheduled<T> {
    fire_at_ms: u64,
    item: T,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler<T> {
    pending: Vec<Scheduled<T>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, fire_at_ms: u64, item: T) {
        self.pending.push(Scheduled { fire_at_ms, item });
    }

    /// Removes and returns every item due at `now_ms`, preserving
    /// scheduling order among items with equal deadlines.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<T> {
        let mut due = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending.len());
        for entry in self.pending.drain(..) {
            if entry.fire_at_ms <= now_ms {
                due.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.pending = remaining;
        due.sort_by_key(|entry| entry.fire_at_ms);
        due.into_iter().map(|entry| entry.item).collect()
    }

    /// Drops every pending item. Used on session cancellation so nothing
    /// fires into a finalized session.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.pending.iter().map(|entry| entry.fire_at_ms).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
