//! Plain data row types written by output backends.

use td_core::{RoadId, Tick, TurnDirection};
use td_sched::{LatenessRecord, SpawnRequest, TickStats};

/// `destination` value for a request with no known exit road.
pub const NO_DESTINATION: u32 = RoadId::INVALID.0;

/// One emitted spawn request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRow {
    pub tick:        u64,
    pub spawn_secs:  f64,
    pub lane:        u32,
    pub road:        u32,
    pub direction:   TurnDirection,
    pub vehicle:     u16,
    pub class:       u16,
    /// [`NO_DESTINATION`] when the selector had no exit.
    pub destination: u32,
}

impl SpawnRow {
    pub fn new(tick: Tick, request: &SpawnRequest) -> Self {
        Self {
            tick:        tick.0,
            spawn_secs:  request.spawn_secs,
            lane:        request.lane.0,
            road:        request.road.0,
            direction:   request.direction,
            vehicle:     request.vehicle.0,
            class:       request.class.0,
            destination: request.destination.map_or(NO_DESTINATION, |r| r.0),
        }
    }
}

/// Scheduler counters at the end of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:       u64,
    pub now_secs:   f64,
    pub spawned:    u64,
    pub scheduled:  u64,
    pub dispatched: u64,
    pub pending:    u64,
    pub late:       u64,
}

impl From<&TickStats> for TickSummaryRow {
    fn from(stats: &TickStats) -> Self {
        Self {
            tick:       stats.tick.0,
            now_secs:   stats.now_secs,
            spawned:    stats.spawned,
            scheduled:  stats.scheduled,
            dispatched: stats.dispatched,
            pending:    stats.pending,
            late:       stats.late,
        }
    }
}

/// One late dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatenessRow {
    pub tick:          u64,
    pub lane:          u32,
    pub road:          u32,
    pub direction:     TurnDirection,
    pub spawn_secs:    f64,
    pub dispatch_secs: f64,
    pub delay_secs:    f64,
}

impl LatenessRow {
    pub fn new(tick: Tick, record: &LatenessRecord) -> Self {
        Self {
            tick:          tick.0,
            lane:          record.lane.0,
            road:          record.road.0,
            direction:     record.direction,
            spawn_secs:    record.spawn_secs,
            dispatch_secs: record.dispatch_secs,
            delay_secs:    record.delay_secs,
        }
    }
}
