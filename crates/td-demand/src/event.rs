use std::cmp::Ordering;

use td_core::{SimRng, TurnAction, TurnDirection, TurnWeights};

/// One vehicle that must be spawned at `spawn_secs` and will perform
/// `direction` at the next intersection.
///
/// Ordered by spawn time, ties broken by `seq` (creation order), so a queue
/// built by appending sorted batches is totally ordered.
#[derive(Copy, Clone, Debug)]
pub struct ScheduledEvent {
    pub spawn_secs: f64,
    pub direction:  TurnDirection,
    /// Creation sequence number, unique per scheduler.
    pub seq:        u64,
}

impl ScheduledEvent {
    /// Create an event, resolving a compound `action` by a weighted draw.
    pub fn new(
        spawn_secs: f64,
        action:     TurnAction,
        weights:    &TurnWeights,
        rng:        &mut SimRng,
        seq:        u64,
    ) -> Self {
        Self {
            spawn_secs,
            direction: action.resolve(weights, rng),
            seq,
        }
    }

    /// `true` once the clock has reached the spawn time.
    #[inline]
    pub fn is_due(&self, now_secs: f64) -> bool {
        self.spawn_secs <= now_secs
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.spawn_secs
            .total_cmp(&other.spawn_secs)
            .then(self.seq.cmp(&other.seq))
    }
}
