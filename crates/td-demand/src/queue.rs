//! `SpawnQueue` — one road's pending spawn events, earliest first.
//!
//! The window appends each bucket's events as a sorted batch after the
//! events held over from earlier buckets.  Every new batch starts at or after
//! the previous bucket's start, and held-over events are never re-timed, so
//! the queue stays time-ordered without ever re-sorting.
//!
//! Plain dispatch pops the head.  Restricted dispatch may claim any due event
//! (not only the head), hence [`SpawnQueue::remove`].

use std::collections::VecDeque;

use crate::ScheduledEvent;

#[derive(Clone, Debug, Default)]
pub struct SpawnQueue {
    inner: VecDeque<ScheduledEvent>,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` at the tail.
    ///
    /// Callers must append in non-decreasing spawn-time order.
    pub fn push_back(&mut self, event: ScheduledEvent) {
        debug_assert!(
            self.inner.back().is_none_or(|last| last.spawn_secs <= event.spawn_secs),
            "spawn queue must stay time-ordered"
        );
        self.inner.push_back(event);
    }

    /// The earliest pending event.
    pub fn front(&self) -> Option<&ScheduledEvent> {
        self.inner.front()
    }

    pub fn pop_front(&mut self) -> Option<ScheduledEvent> {
        self.inner.pop_front()
    }

    /// Remove and return the event at queue position `pos`.
    pub fn remove(&mut self, pos: usize) -> Option<ScheduledEvent> {
        self.inner.remove(pos)
    }

    /// The due prefix: `(position, event)` pairs with `spawn_secs <= now`.
    pub fn due(&self, now_secs: f64) -> impl Iterator<Item = (usize, &ScheduledEvent)> + '_ {
        self.inner
            .iter()
            .enumerate()
            .take_while(move |(_, e)| e.is_due(now_secs))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> + '_ {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
