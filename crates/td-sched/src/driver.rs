//! `SpawnLoop` — drives a scheduler over a fixed list of spawn points.
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① begin_tick (explicit mode only)
//!   ② for each spawn point, in list order:
//!        step(lanes, lane, tick_secs, class) → requests → on_spawn
//!        new lateness records                           → on_late
//!   ③ on_tick_end; on_summary every output_interval_ticks
//! ```
//!
//! Visiting the same spawn points once per tick in a fixed order is exactly
//! the precondition implicit tick detection relies on.

use td_core::{LaneId, RunConfig, Tick, TickMode, VehicleClassId};
use td_lanes::LaneModel;

use crate::{RunSummary, SchedResult, SchedulerObserver, SpawnScheduler, TickStats};

/// A lane the driver services every tick, and the vehicle class spawned
/// there.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpawnPoint {
    pub lane:  LaneId,
    pub class: VehicleClassId,
}

impl SpawnPoint {
    pub fn new(lane: LaneId, class: VehicleClassId) -> Self {
        Self { lane, class }
    }
}

pub struct SpawnLoop<S: SpawnScheduler> {
    pub config:       RunConfig,
    pub scheduler:    S,
    spawn_points:     Vec<SpawnPoint>,
    ticks_run:        u64,
    requests:         u64,
}

impl<S: SpawnScheduler> SpawnLoop<S> {
    /// # Errors
    ///
    /// Rejects an invalid `config` (non-positive tick size).
    pub fn new(config: RunConfig, scheduler: S, spawn_points: Vec<SpawnPoint>) -> SchedResult<Self> {
        config.validate()?;
        Ok(Self { config, scheduler, spawn_points, ticks_run: 0, requests: 0 })
    }

    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    /// Ticks driven so far.
    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    ///
    /// Stops at the first fatal error.
    pub fn run<L: LaneModel, O: SchedulerObserver>(
        &mut self,
        lanes:    &L,
        observer: &mut O,
    ) -> SchedResult<RunSummary> {
        log::info!(
            "spawn loop: {} ticks of {}s over {} spawn points ({:?} ticks)",
            self.config.total_ticks,
            self.config.tick_secs,
            self.spawn_points.len(),
            self.scheduler.tick_mode()
        );
        while Tick(self.ticks_run) < self.config.end_tick() {
            self.process_tick(lanes, observer)?;
        }
        let summary = self.summary();
        log::info!(
            "spawn loop finished: {} requests, {} of {} events dispatched, {} pending, {} late",
            summary.requests,
            summary.dispatched,
            summary.scheduled,
            summary.pending,
            summary.late
        );
        observer.on_run_end(&summary);
        Ok(summary)
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<L: LaneModel, O: SchedulerObserver>(
        &mut self,
        n:        u64,
        lanes:    &L,
        observer: &mut O,
    ) -> SchedResult<()> {
        for _ in 0..n {
            self.process_tick(lanes, observer)?;
        }
        Ok(())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks:      self.ticks_run,
            requests:   self.requests,
            scheduled:  self.scheduler.total_scheduled(),
            dispatched: self.scheduler.total_dispatched(),
            pending:    self.scheduler.pending_in_current_window(),
            late:       self.scheduler.lateness().len() as u64,
        }
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick<L: LaneModel, O: SchedulerObserver>(
        &mut self,
        lanes:    &L,
        observer: &mut O,
    ) -> SchedResult<()> {
        let tick = Tick(self.ticks_run);
        let tick_secs = self.config.tick_secs;
        observer.on_tick_start(tick);

        if self.scheduler.tick_mode() == TickMode::Explicit {
            self.scheduler.begin_tick(tick_secs)?;
        }

        let mut spawned = 0u64;
        for point in &self.spawn_points {
            let late_before = self.scheduler.lateness().len();
            let requests = self.scheduler.step(lanes, point.lane, tick_secs, point.class)?;
            for request in &requests {
                observer.on_spawn(tick, request);
            }
            for record in &self.scheduler.lateness()[late_before..] {
                observer.on_late(tick, record);
            }
            spawned += requests.len() as u64;
        }
        self.requests += spawned;
        self.ticks_run += 1;

        let stats = TickStats {
            tick,
            now_secs:   self.scheduler.clock().now_secs,
            spawned,
            scheduled:  self.scheduler.total_scheduled(),
            dispatched: self.scheduler.total_dispatched(),
            pending:    self.scheduler.pending_in_current_window(),
            late:       self.scheduler.lateness().len() as u64,
        };
        observer.on_tick_end(&stats);
        if self.config.output_interval_ticks > 0
            && tick.0.is_multiple_of(self.config.output_interval_ticks)
        {
            observer.on_summary(&stats);
        }
        Ok(())
    }
}
