use td_core::{LaneId, RoadId, TurnDirection, VehicleClassId, VehicleSpecId};

/// One vehicle the simulation should create.
///
/// A dispatched event yields one request per matching vehicle spec.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Scheduled spawn time (seconds since the demand epoch), never after
    /// the clock at dispatch.
    pub spawn_secs:  f64,
    pub lane:        LaneId,
    pub road:        RoadId,
    pub direction:   TurnDirection,
    pub vehicle:     VehicleSpecId,
    pub class:       VehicleClassId,
    /// `None` if the destination selector knows no exit for the movement.
    pub destination: Option<RoadId>,
}
