//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `TdError` as one variant
//! via `#[from]`, so configuration problems raised by core types (clock,
//! catalog, turn labels) surface unchanged at the scheduler boundary.

use thiserror::Error;

use crate::VehicleSpecId;

/// The top-level error type for `td-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum TdError {
    #[error("vehicle spec {0} not found")]
    VehicleSpecNotFound(VehicleSpecId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for all `td-*` crates.
pub type TdResult<T> = Result<T, TdError>;
