//! `RestrictedDemandScheduler` — spawn scheduling under lane-level turn
//! restrictions.
//!
//! # Claiming
//!
//! A due event may only spawn on a lane from which its vehicle class may
//! perform its turn.  When a lane is serviced, the road's queue is scanned
//! from the front over the due prefix; the lane claims the **first** due
//! event it is eligible for.  At most one event is claimed per lane per tick.
//!
//! Because a lane skips due events it cannot serve, a later-queued event may
//! dispatch before an earlier due one on the same tick (on a different
//! lane).  No event ever dispatches before its spawn time.
//!
//! # Lane policy
//!
//! | Policy           | The calling lane claims when…                               |
//! |------------------|-------------------------------------------------------------|
//! | `AnyEligible`    | it is eligible for the event                                |
//! | `LeastCongested` | it is eligible and no other eligible lane that is still     |
//! |                  | free this tick has fewer vehicles queued ahead              |
//!
//! Under `LeastCongested` a lane only gives way to lanes that were serviced
//! as spawn points during the previous tick, and never once the event is
//! late, so an event cannot wait on a lane the driver does not visit.
//!
//! Lanes must keep their vehicles: the scheduler refuses to build when the
//! lane model allows lane changing.

use rustc_hash::FxHashSet;

use td_core::{
    IntersectionId, LaneId, RoadId, SimClock, SimRng, TickMode, VehicleCatalog, VehicleClassId,
};
use td_demand::DemandTable;
use td_lanes::{DestinationSelector, LaneModel};

use crate::scheduler::build_requests;
use crate::{
    DemandWindow, EligibilityCache, EligibilityKey, LatenessLog, LatenessRecord, SchedError,
    SchedResult, SpawnRequest, SpawnScheduler, TickTracker,
};

// ── LanePolicy ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LanePolicy {
    #[default]
    AnyEligible,
    LeastCongested,
}

// ── RestrictedDemandScheduler ─────────────────────────────────────────────────

pub struct RestrictedDemandScheduler<'a, D: DestinationSelector> {
    pub(crate) window:       DemandWindow<'a>,
    pub(crate) ticks:        TickTracker,
    pub(crate) rng:          SimRng,
    pub(crate) catalog:      VehicleCatalog,
    pub(crate) destinations: D,
    pub(crate) policy:       LanePolicy,
    pub(crate) cache:        EligibilityCache,
    pub(crate) used:         FxHashSet<LaneId>,
    pub(crate) lateness:     LatenessLog,
}

impl<'a, D: DestinationSelector> RestrictedDemandScheduler<'a, D> {
    /// Service `spawn_point` for vehicles of `class`.
    ///
    /// # Errors
    ///
    /// - [`SchedError::UnknownVehicleClass`] if the catalog has no spec of
    ///   `class` (checked before any state changes).
    /// - [`SchedError::UnknownLane`] if the lane model does not know
    ///   `spawn_point`.
    /// - [`SchedError::Config`] for a non-positive tick size.
    /// - Window-advance invariant errors (fatal).
    pub fn act<L: LaneModel>(
        &mut self,
        lanes:       &L,
        spawn_point: LaneId,
        tick_secs:   f64,
        class:       VehicleClassId,
    ) -> SchedResult<Vec<SpawnRequest>> {
        let specs = self.catalog.ids_of_class(class);
        if specs.is_empty() {
            return Err(SchedError::UnknownVehicleClass(class));
        }
        let road = lanes.road_of(spawn_point).ok_or(SchedError::UnknownLane(spawn_point))?;
        let intersection = lanes
            .intersection_ahead(spawn_point)
            .ok_or(SchedError::UnknownLane(spawn_point))?;

        if self.ticks.visit(spawn_point, tick_secs)? {
            self.used.clear();
        }
        self.cache.sync(lanes.restriction_epoch());

        let now = self.ticks.clock().now_secs;
        self.window.ensure(now, &mut self.rng)?;

        if self.used.contains(&spawn_point) {
            return Ok(Vec::new());
        }
        let Some(pos) = self.find_claim(lanes, spawn_point, road, intersection, class, now) else {
            return Ok(Vec::new());
        };
        let Some(event) = self.window.queue_mut(road).and_then(|q| q.remove(pos)) else {
            return Ok(Vec::new());
        };
        self.window.record_dispatch();
        self.used.insert(spawn_point);

        let tick = self.ticks.clock().tick_secs;
        if event.spawn_secs < now - tick {
            self.lateness.record(event.direction, event.spawn_secs, now, spawn_point, road);
        }
        log::debug!(
            "{}: {spawn_point} claimed {} ({road}) scheduled {:.1}s",
            self.ticks.clock(),
            event.direction,
            event.spawn_secs
        );

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

    /// Queue position of the first due event `lane` may claim.
    fn find_claim<L: LaneModel>(
        &mut self,
        lanes:        &L,
        lane:         LaneId,
        road:         RoadId,
        intersection: IntersectionId,
        class:        VehicleClassId,
        now:          f64,
    ) -> Option<usize> {
        let queue = self.window.queue(road)?;
        for (pos, event) in queue.due(now) {
            let key = EligibilityKey { intersection, road, class, direction: event.direction };
            let eligible = self.cache.eligible(key, lanes);
            if !eligible.contains(&lane) {
                continue;
            }
            match self.policy {
                LanePolicy::AnyEligible => return Some(pos),
                LanePolicy::LeastCongested => {
                    // A late event goes to whichever lane asks first.
                    if event.spawn_secs < now - self.ticks.clock().tick_secs {
                        return Some(pos);
                    }
                    let own = lanes.congestion_count(lane, 0.0);
                    let beaten = eligible
                        .iter()
                        .filter(|&&other| {
                            other != lane
                                && !self.used.contains(&other)
                                && !self.ticks.serviced(other)
                                && self.ticks.serviced_last_tick(other)
                        })
                        .any(|&other| lanes.congestion_count(other, 0.0) < own);
                    if !beaten {
                        return Some(pos);
                    }
                }
            }
        }
        None
    }

    /// Start a new tick explicitly; clears the used-lane set.
    pub fn begin_tick(&mut self, tick_secs: f64) -> SchedResult<()> {
        self.ticks.begin_tick(tick_secs)?;
        self.used.clear();
        Ok(())
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

    pub fn lateness(&self) -> &LatenessLog {
        &self.lateness
    }

    /// `true` if `lane` has claimed an event this tick.
    pub fn lane_used(&self, lane: LaneId) -> bool {
        self.used.contains(&lane)
    }

    pub fn policy(&self) -> LanePolicy {
        self.policy
    }

    pub fn cache(&self) -> &EligibilityCache {
        &self.cache
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

impl<D: DestinationSelector> SpawnScheduler for RestrictedDemandScheduler<'_, D> {
    fn step<L: LaneModel>(
        &mut self,
        lanes:       &L,
        spawn_point: LaneId,
        tick_secs:   f64,
        class:       VehicleClassId,
    ) -> SchedResult<Vec<SpawnRequest>> {
        self.act(lanes, spawn_point, tick_secs, class)
    }

    fn begin_tick(&mut self, tick_secs: f64) -> SchedResult<()> {
        RestrictedDemandScheduler::begin_tick(self, tick_secs)
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

    fn lateness(&self) -> &[LatenessRecord] {
        self.lateness.records()
    }
}
