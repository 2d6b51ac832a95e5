//! Lateness diagnostics for the restricted scheduler.
//!
//! An event is *late* when it is dispatched more than one tick after its
//! scheduled time (`spawn < clock − tick`).  Lateness never blocks dispatch;
//! it is only recorded.

use td_core::{LaneId, RoadId, TurnDirection};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LatenessRecord {
    pub direction:     TurnDirection,
    /// Scheduled spawn time `t`.
    pub spawn_secs:    f64,
    /// Clock at dispatch `c`.
    pub dispatch_secs: f64,
    /// `c − t`.
    pub delay_secs:    f64,
    pub lane:          LaneId,
    pub road:          RoadId,
}

/// Append-only log of late dispatches.
#[derive(Clone, Debug, Default)]
pub struct LatenessLog {
    records: Vec<LatenessRecord>,
}

impl LatenessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        direction:     TurnDirection,
        spawn_secs:    f64,
        dispatch_secs: f64,
        lane:          LaneId,
        road:          RoadId,
    ) {
        let delay_secs = dispatch_secs - spawn_secs;
        log::warn!(
            "late dispatch on {lane} ({road}, {direction}): scheduled {spawn_secs:.1}s, dispatched {dispatch_secs:.1}s, {delay_secs:.1}s late"
        );
        self.records.push(LatenessRecord {
            direction,
            spawn_secs,
            dispatch_secs,
            delay_secs,
            lane,
            road,
        });
    }

    /// Number of late dispatches so far.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[LatenessRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
