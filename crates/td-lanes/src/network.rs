//! Reference lane network and builder.
//!
//! # Data layout
//!
//! Lanes are grouped by road in **CSR** form.  Given a `RoadId r`, its lanes
//! occupy the slice:
//!
//! ```text
//! road_lanes[ road_lane_start[r] .. road_lane_start[r+1] ]
//! ```
//!
//! sorted by `LaneId`.  Per-lane arrays (`lane_road`, `lane_length_m`,
//! `lane_turns`) are indexed by `LaneId`.  A lane's turn permissions apply to
//! every vehicle class unless overridden for a specific class.
//!
//! # Mutation after build
//!
//! Restrictions and queued vehicles may change while a run is in progress.
//! Every restriction change bumps [`LaneModel::restriction_epoch`]; placing
//! or clearing vehicles does not.

use rustc_hash::FxHashMap;

use td_core::{IntersectionId, LaneId, RoadId, TurnDirection, TurnSet, VehicleClassId};

use crate::{LaneError, LaneModel, LaneResult};

// ── LaneNetwork ───────────────────────────────────────────────────────────────

/// Roads, their lanes, per-lane turn permissions, and queued vehicles.
///
/// Do not construct directly; use [`LaneNetworkBuilder`].
#[derive(Clone, Debug)]
pub struct LaneNetwork {
    // ── Road data ─────────────────────────────────────────────────────────
    /// Intersection each road leads into.  Indexed by `RoadId`.
    pub road_intersection: Vec<IntersectionId>,

    /// CSR row pointer.  Lanes of road `r` are
    /// `road_lanes[road_lane_start[r] .. road_lane_start[r+1]]`.
    pub road_lane_start: Vec<u32>,

    /// Lane IDs grouped by road, ascending within each road.
    pub road_lanes: Vec<LaneId>,

    // ── Lane data (indexed by LaneId) ─────────────────────────────────────
    pub lane_road: Vec<RoadId>,

    /// Length from the lane's spawn position to the stop line, in metres.
    pub lane_length_m: Vec<f32>,

    /// Turns permitted for every class unless overridden.
    pub lane_turns: Vec<TurnSet>,

    class_turns:    FxHashMap<(LaneId, VehicleClassId), TurnSet>,
    /// Positions (metres from the spawn end) of vehicles on each lane.
    lane_vehicles:  Vec<Vec<f32>>,
    lane_changing:  bool,
    epoch:          u64,
}

impl LaneNetwork {
    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn road_count(&self) -> usize {
        self.road_intersection.len()
    }

    pub fn lane_count(&self) -> usize {
        self.lane_road.len()
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// The lanes of `road`, ascending.  Empty for an unknown road.
    pub fn lanes_of(&self, road: RoadId) -> &[LaneId] {
        if road.index() >= self.road_count() {
            return &[];
        }
        let start = self.road_lane_start[road.index()] as usize;
        let end   = self.road_lane_start[road.index() + 1] as usize;
        &self.road_lanes[start..end]
    }

    /// Effective turn permissions of `lane` for `class`.
    pub fn permitted_turns(&self, lane: LaneId, class: VehicleClassId) -> TurnSet {
        self.class_turns
            .get(&(lane, class))
            .copied()
            .unwrap_or_else(|| self.lane_turns.get(lane.index()).copied().unwrap_or(TurnSet::EMPTY))
    }

    // ── Restriction changes (bump the epoch) ──────────────────────────────

    /// Override the turns `class` may perform from `lane`.
    pub fn restrict(&mut self, lane: LaneId, class: VehicleClassId, turns: TurnSet) -> LaneResult<()> {
        self.check_lane(lane)?;
        self.class_turns.insert((lane, class), turns);
        self.epoch += 1;
        Ok(())
    }

    /// Drop a class-specific override, restoring the lane's default turns.
    pub fn clear_restriction(&mut self, lane: LaneId, class: VehicleClassId) -> LaneResult<()> {
        self.check_lane(lane)?;
        if self.class_turns.remove(&(lane, class)).is_some() {
            self.epoch += 1;
        }
        Ok(())
    }

    /// Replace the default turn permissions of `lane`.
    pub fn set_lane_turns(&mut self, lane: LaneId, turns: TurnSet) -> LaneResult<()> {
        self.check_lane(lane)?;
        self.lane_turns[lane.index()] = turns;
        self.epoch += 1;
        Ok(())
    }

    // ── Queued vehicles ───────────────────────────────────────────────────

    /// Record a vehicle on `lane` at `position_m` from the spawn end.
    pub fn place_vehicle(&mut self, lane: LaneId, position_m: f32) -> LaneResult<()> {
        self.check_lane(lane)?;
        let length = self.lane_length_m[lane.index()];
        if !(0.0..=length).contains(&position_m) {
            return Err(LaneError::Config(format!(
                "position {position_m} m is outside lane {lane} (length {length} m)"
            )));
        }
        self.lane_vehicles[lane.index()].push(position_m);
        Ok(())
    }

    /// Remove every vehicle from every lane.
    pub fn clear_vehicles(&mut self) {
        self.lane_vehicles.iter_mut().for_each(Vec::clear);
    }

    fn check_lane(&self, lane: LaneId) -> LaneResult<()> {
        if lane.index() < self.lane_count() {
            Ok(())
        } else {
            Err(LaneError::UnknownLane(lane))
        }
    }
}

impl LaneModel for LaneNetwork {
    fn road_of(&self, lane: LaneId) -> Option<RoadId> {
        self.lane_road.get(lane.index()).copied()
    }

    fn intersection_ahead(&self, lane: LaneId) -> Option<IntersectionId> {
        let road = self.road_of(lane)?;
        self.road_intersection.get(road.index()).copied()
    }

    fn eligible_lanes(
        &self,
        intersection: IntersectionId,
        road:         RoadId,
        class:        VehicleClassId,
        turn:         TurnDirection,
    ) -> Vec<LaneId> {
        if self.road_intersection.get(road.index()) != Some(&intersection) {
            return Vec::new();
        }
        self.lanes_of(road)
            .iter()
            .copied()
            .filter(|&lane| self.permitted_turns(lane, class).contains(turn))
            .collect()
    }

    fn congestion_count(&self, lane: LaneId, from_position_m: f32) -> u32 {
        self.lane_vehicles
            .get(lane.index())
            .map_or(0, |v| v.iter().filter(|&&p| p >= from_position_m).count() as u32)
    }

    fn lane_changing_allowed(&self) -> bool {
        self.lane_changing
    }

    fn restriction_epoch(&self) -> u64 {
        self.epoch
    }
}

// ── LaneNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`LaneNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use td_core::{IntersectionId, TurnDirection, TurnSet};
/// use td_lanes::LaneNetworkBuilder;
///
/// let mut b = LaneNetworkBuilder::new();
/// let road = b.add_road(IntersectionId(0));
/// b.add_lane(road, 120.0, TurnSet::of(&[TurnDirection::Left])).unwrap();
/// b.add_lane(road, 120.0, TurnSet::of(&[TurnDirection::Straight, TurnDirection::Right])).unwrap();
/// let net = b.build();
/// assert_eq!(net.lanes_of(road).len(), 2);
/// ```
pub struct LaneNetworkBuilder {
    roads:         Vec<IntersectionId>,
    lanes:         Vec<RawLane>,
    class_turns:   FxHashMap<(LaneId, VehicleClassId), TurnSet>,
    lane_changing: bool,
}

struct RawLane {
    road:     RoadId,
    length_m: f32,
    turns:    TurnSet,
}

impl LaneNetworkBuilder {
    pub fn new() -> Self {
        Self {
            roads:         Vec::new(),
            lanes:         Vec::new(),
            class_turns:   FxHashMap::default(),
            lane_changing: false,
        }
    }

    /// Add a road leading into `intersection` and return its `RoadId`
    /// (sequential from 0).
    pub fn add_road(&mut self, intersection: IntersectionId) -> RoadId {
        let id = RoadId(self.roads.len() as u32);
        self.roads.push(intersection);
        id
    }

    /// Add a lane to `road` and return its `LaneId` (sequential from 0).
    ///
    /// `length_m` is the distance from the spawn end to the stop line.
    pub fn add_lane(&mut self, road: RoadId, length_m: f32, turns: TurnSet) -> LaneResult<LaneId> {
        if road.index() >= self.roads.len() {
            return Err(LaneError::UnknownRoad(road));
        }
        if !(length_m.is_finite() && length_m > 0.0) {
            return Err(LaneError::Config(format!("lane length must be positive, got {length_m}")));
        }
        let id = LaneId(self.lanes.len() as u32);
        self.lanes.push(RawLane { road, length_m, turns });
        Ok(id)
    }

    /// Class-specific turn permissions for a lane added earlier.
    pub fn restrict(&mut self, lane: LaneId, class: VehicleClassId, turns: TurnSet) -> LaneResult<()> {
        if lane.index() >= self.lanes.len() {
            return Err(LaneError::UnknownLane(lane));
        }
        self.class_turns.insert((lane, class), turns);
        Ok(())
    }

    pub fn lane_changing(mut self, allowed: bool) -> Self {
        self.lane_changing = allowed;
        self
    }

    pub fn road_count(&self) -> usize { self.roads.len() }
    pub fn lane_count(&self) -> usize { self.lanes.len() }

    /// Consume the builder and produce a [`LaneNetwork`].
    pub fn build(self) -> LaneNetwork {
        let road_count = self.roads.len();

        // Lane IDs stay as assigned; only the per-road index is sorted.
        let mut grouped: Vec<LaneId> = (0..self.lanes.len() as u32).map(LaneId).collect();
        grouped.sort_by_key(|l| (self.lanes[l.index()].road, *l));

        let mut road_lane_start = vec![0u32; road_count + 1];
        for lane in &self.lanes {
            road_lane_start[lane.road.index() + 1] += 1;
        }
        for i in 1..=road_count {
            road_lane_start[i] += road_lane_start[i - 1];
        }
        debug_assert_eq!(road_lane_start[road_count] as usize, self.lanes.len());

        LaneNetwork {
            road_lane_start,
            road_lanes:    grouped,
            lane_road:     self.lanes.iter().map(|l| l.road).collect(),
            lane_length_m: self.lanes.iter().map(|l| l.length_m).collect(),
            lane_turns:    self.lanes.iter().map(|l| l.turns).collect(),
            lane_vehicles: vec![Vec::new(); self.lanes.len()],
            road_intersection: self.roads,
            class_turns:   self.class_turns,
            lane_changing: self.lane_changing,
            epoch:         0,
        }
    }
}

impl Default for LaneNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
