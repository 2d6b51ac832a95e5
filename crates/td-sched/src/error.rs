use thiserror::Error;

use td_core::{LaneId, RoadId, TdError, VehicleClassId};
use td_demand::DemandError;

#[derive(Debug, Error)]
pub enum SchedError {
    #[error("scheduler configuration error: {0}")]
    Config(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    /// `scheduled − dispatched` no longer equals the number of queued events.
    /// Always a bug in the scheduler, never bad input.
    #[error("conservation violated: scheduled {scheduled} − dispatched {dispatched} ≠ pending {pending}")]
    ConservationViolated {
        scheduled:  u64,
        dispatched: u64,
        pending:    u64,
    },

    #[error("action pool for {road} ran dry in bucket {bucket} with vehicles left to assign")]
    EmptyActionPool { road: RoadId, bucket: usize },

    #[error("spawn point {0} is not a lane of the lane model")]
    UnknownLane(LaneId),

    #[error("no vehicle specs registered for class {0}")]
    UnknownVehicleClass(VehicleClassId),

    #[error(transparent)]
    Demand(#[from] DemandError),

    #[error(transparent)]
    Core(#[from] TdError),
}

pub type SchedResult<T> = Result<T, SchedError>;
