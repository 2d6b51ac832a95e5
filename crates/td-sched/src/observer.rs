//! Driver observer trait for progress reporting and data collection.

use td_core::Tick;

use crate::{LatenessRecord, SpawnRequest};

/// Counters at the end of one tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TickStats {
    pub tick:       Tick,
    /// Clock at the end of the tick.
    pub now_secs:   f64,
    /// Requests emitted this tick.
    pub spawned:    u64,
    pub scheduled:  u64,
    pub dispatched: u64,
    pub pending:    u64,
    /// Late dispatches so far.
    pub late:       u64,
}

/// Totals after the final tick.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub ticks:      u64,
    pub requests:   u64,
    pub scheduled:  u64,
    pub dispatched: u64,
    pub pending:    u64,
    pub late:       u64,
}

/// Callbacks invoked by [`SpawnLoop::run`][crate::SpawnLoop::run] at key
/// points in the tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
pub trait SchedulerObserver {
    /// Called at the very start of each tick, before any spawn point is
    /// serviced.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called for every request, in emission order.
    fn on_spawn(&mut self, _tick: Tick, _request: &SpawnRequest) {}

    /// Called for every late dispatch, right after its requests.
    fn on_late(&mut self, _tick: Tick, _record: &LatenessRecord) {}

    /// Called at the end of each tick.
    fn on_tick_end(&mut self, _stats: &TickStats) {}

    /// Called at summary intervals (every `config.output_interval_ticks`
    /// ticks).
    fn on_summary(&mut self, _stats: &TickStats) {}

    /// Called once after the final tick completes.
    fn on_run_end(&mut self, _summary: &RunSummary) {}
}

/// A [`SchedulerObserver`] that does nothing.
pub struct NoopObserver;

impl SchedulerObserver for NoopObserver {}
