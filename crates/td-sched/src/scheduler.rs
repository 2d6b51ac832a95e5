//! `DemandScheduler` — the unrestricted spawn scheduler.
//!
//! Each call services one spawn point (a lane): detect the tick, expand the
//! window up to the clock, and if the head of the lane's road queue is due,
//! dispatch it as one [`SpawnRequest`] per vehicle spec.

use td_core::{
    LaneId, RoadId, SimClock, SimRng, TickMode, VehicleCatalog, VehicleClassId, VehicleSpecId,
};
use td_demand::{DemandTable, ScheduledEvent};
use td_lanes::{DestinationSelector, LaneModel};

use crate::{DemandWindow, LatenessRecord, SchedError, SchedResult, SpawnRequest, TickTracker};

// ── SpawnScheduler trait ──────────────────────────────────────────────────────

/// The interface [`SpawnLoop`](crate::SpawnLoop) drives.  Implemented by both
/// schedulers; the plain scheduler ignores `class`.
pub trait SpawnScheduler {
    fn step<L: LaneModel>(
        &mut self,
        lanes:       &L,
        spawn_point: LaneId,
        tick_secs:   f64,
        class:       VehicleClassId,
    ) -> SchedResult<Vec<SpawnRequest>>;

    fn begin_tick(&mut self, tick_secs: f64) -> SchedResult<()>;

    fn tick_mode(&self) -> TickMode;

    fn clock(&self) -> &SimClock;

    fn total_scheduled(&self) -> u64;

    fn total_dispatched(&self) -> u64;

    fn pending_in_current_window(&self) -> u64;

    /// Late dispatches recorded so far, oldest first.
    fn lateness(&self) -> &[LatenessRecord] {
        &[]
    }
}

// ── DemandScheduler ───────────────────────────────────────────────────────────

pub struct DemandScheduler<'a, D: DestinationSelector> {
    pub(crate) window:       DemandWindow<'a>,
    pub(crate) ticks:        TickTracker,
    pub(crate) rng:          SimRng,
    pub(crate) catalog:      VehicleCatalog,
    pub(crate) destinations: D,
}

impl<'a, D: DestinationSelector> DemandScheduler<'a, D> {
    /// Service `spawn_point` for the tick of size `tick_secs`.
    ///
    /// Returns an empty vec when nothing is due or the lane's road has no
    /// demand.
    ///
    /// # Errors
    ///
    /// - [`SchedError::UnknownLane`] if the lane model does not know
    ///   `spawn_point`.
    /// - [`SchedError::Config`] for a non-positive tick size.
    /// - [`SchedError::ConservationViolated`] / [`SchedError::EmptyActionPool`]
    ///   from the window advance (fatal).
    pub fn act<L: LaneModel>(
        &mut self,
        lanes:       &L,
        spawn_point: LaneId,
        tick_secs:   f64,
    ) -> SchedResult<Vec<SpawnRequest>> {
        let road = lanes.road_of(spawn_point).ok_or(SchedError::UnknownLane(spawn_point))?;
        self.ticks.visit(spawn_point, tick_secs)?;

        let now = self.ticks.clock().now_secs;
        self.window.ensure(now, &mut self.rng)?;

        let Some(queue) = self.window.queue_mut(road) else {
            return Ok(Vec::new());
        };
        let Some(event) = queue.front().copied().filter(|e| e.is_due(now)) else {
            return Ok(Vec::new());
        };
        queue.pop_front();
        self.window.record_dispatch();

        log::debug!(
            "{}: dispatched {} on {spawn_point} ({road}) scheduled {:.1}s",
            self.ticks.clock(),
            event.direction,
            event.spawn_secs
        );
        let specs = self.catalog.ids().collect();
        build_requests(
            &event,
            spawn_point,
            road,
            specs,
            &self.catalog,
            &self.destinations,
            &mut self.rng,
        )
    }

    /// Start a new tick explicitly (the only way to start one in
    /// [`TickMode::Explicit`]).
    pub fn begin_tick(&mut self, tick_secs: f64) -> SchedResult<()> {
        self.ticks.begin_tick(tick_secs)
    }

    // ── Diagnostics ───────────────────────────────────────────────────────

    pub fn total_scheduled(&self) -> u64 {
        self.window.scheduled()
    }

    pub fn total_dispatched(&self) -> u64 {
        self.window.dispatched()
    }

    pub fn pending_in_current_window(&self) -> u64 {
        self.window.pending()
    }

    pub fn clock(&self) -> &SimClock {
        self.ticks.clock()
    }

    pub fn window(&self) -> &DemandWindow<'a> {
        &self.window
    }

    pub fn table(&self) -> &'a DemandTable {
        self.window.table()
    }
}

impl<D: DestinationSelector> SpawnScheduler for DemandScheduler<'_, D> {
    fn step<L: LaneModel>(
        &mut self,
        lanes:       &L,
        spawn_point: LaneId,
        tick_secs:   f64,
        _class:      VehicleClassId,
    ) -> SchedResult<Vec<SpawnRequest>> {
        self.act(lanes, spawn_point, tick_secs)
    }

    fn begin_tick(&mut self, tick_secs: f64) -> SchedResult<()> {
        self.ticks.begin_tick(tick_secs)
    }

    fn tick_mode(&self) -> TickMode {
        self.ticks.mode()
    }

    fn clock(&self) -> &SimClock {
        self.ticks.clock()
    }

    fn total_scheduled(&self) -> u64 {
        self.window.scheduled()
    }

    fn total_dispatched(&self) -> u64 {
        self.window.dispatched()
    }

    fn pending_in_current_window(&self) -> u64 {
        self.window.pending()
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// One request per spec in `specs`, in shuffled order.
///
/// # Errors
///
/// [`SchedError::Core`] if a spec is missing from `catalog`.
pub(crate) fn build_requests<D: DestinationSelector>(
    event:        &ScheduledEvent,
    lane:         LaneId,
    road:         RoadId,
    mut specs:    Vec<VehicleSpecId>,
    catalog:      &VehicleCatalog,
    destinations: &D,
    rng:          &mut SimRng,
) -> SchedResult<Vec<SpawnRequest>> {
    rng.shuffle(&mut specs);
    specs
        .into_iter()
        .map(|vehicle| {
            let class = catalog.get(vehicle)?.class;
            Ok(SpawnRequest {
                spawn_secs:  event.spawn_secs,
                lane,
                road,
                direction:   event.direction,
                vehicle,
                class,
                destination: destinations.select_destination(road, event.direction, rng),
            })
        })
        .collect()
}
