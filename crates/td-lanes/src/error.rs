//! Lane-subsystem error type.

use thiserror::Error;

use td_core::{LaneId, RoadId};

/// Errors produced by `td-lanes`.
#[derive(Debug, Error)]
pub enum LaneError {
    #[error("lane {0} not found in network")]
    UnknownLane(LaneId),

    #[error("road {0} not found in network")]
    UnknownRoad(RoadId),

    #[error("lane configuration error: {0}")]
    Config(String),
}

pub type LaneResult<T> = Result<T, LaneError>;
