use thiserror::Error;

use td_core::{RoadId, TdError, TurnAction};

/// Configuration errors raised while building or loading demand data.
///
/// All variants are fatal at load time: they describe bad input, never a
/// transient condition.
#[derive(Debug, Error)]
pub enum DemandError {
    #[error("bucket alignment error for {road} at index {index}: {reason}")]
    Alignment {
        road:   RoadId,
        index:  usize,
        reason: String,
    },

    #[error("negative or non-finite time offset {0}")]
    NegativeOffset(f64),

    #[error("bucket starting at {start}s cannot end at {end}s")]
    NegativeDuration { start: f64, end: f64 },

    #[error("bucket starting at {start}s already has a duration")]
    AlreadyClosed { start: f64 },

    #[error("bucket starting at {start}s for {road} has no end")]
    Unbounded { road: RoadId, start: f64 },

    #[error("duplicate turn action {action} in bucket starting at {start}s")]
    DuplicateAction { action: TurnAction, start: f64 },

    #[error("{road} declares total {declared} at {start}s but its counts sum to {actual}")]
    TotalMismatch {
        road:     RoadId,
        start:    f64,
        declared: u64,
        actual:   u64,
    },

    #[error("demand parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] TdError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DemandResult<T> = Result<T, DemandError>;
