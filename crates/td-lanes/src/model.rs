//! The lane model interface.
//!
//! # Pluggability
//!
//! The scheduler never owns road geometry.  It asks a `LaneModel` which road
//! a spawn lane feeds, which lanes may legally perform a turn, and how
//! congested a lane is.  Real simulators implement this over their own
//! network; [`LaneNetwork`](crate::LaneNetwork) is the in-crate reference
//! implementation.
//!
//! # Change signal
//!
//! [`restriction_epoch`](LaneModel::restriction_epoch) must change whenever
//! the answer of [`eligible_lanes`](LaneModel::eligible_lanes) may have
//! changed.  Callers that cache eligibility drop their cache when the epoch
//! moves, and only then.

use td_core::{IntersectionId, LaneId, RoadId, TurnDirection, VehicleClassId};

pub trait LaneModel {
    /// The road-direction a lane belongs to, or `None` for an unknown lane.
    fn road_of(&self, lane: LaneId) -> Option<RoadId>;

    /// The intersection at the downstream end of `lane`.
    fn intersection_ahead(&self, lane: LaneId) -> Option<IntersectionId>;

    /// Lanes of `road` approaching `intersection` on which `class` may
    /// perform `turn`, in ascending `LaneId` order.
    fn eligible_lanes(
        &self,
        intersection: IntersectionId,
        road:         RoadId,
        class:        VehicleClassId,
        turn:         TurnDirection,
    ) -> Vec<LaneId>;

    /// Vehicles queued on `lane` between `from_position_m` and the next
    /// intersection.
    fn congestion_count(&self, lane: LaneId, from_position_m: f32) -> u32;

    /// `true` if vehicles may change lanes after spawning.
    fn lane_changing_allowed(&self) -> bool;

    /// Monotonic counter bumped on every change to lane restrictions.
    fn restriction_epoch(&self) -> u64;
}
