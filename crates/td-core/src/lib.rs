//! `td-core` — foundational types for the `rust_td` demand scheduler.
//!
//! This crate is a dependency of every other `td-*` crate.  It intentionally
//! has no `td-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`ids`]       | `RoadId`, `LaneId`, `IntersectionId`, `VehicleClassId`, `VehicleSpecId` |
//! | [`turn`]      | `TurnDirection`, `TurnAction`, `TurnWeights`, `TurnSet`     |
//! | [`time`]      | `Tick`, `SimClock`, `RunConfig`, `TickMode`                 |
//! | [`rng`]       | `SimRng` (one per scheduler instance)                       |
//! | [`vehicle`]   | `VehicleSpec`, `VehicleCatalog`                             |
//! | [`error`]     | `TdError`, `TdResult`                                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;
pub mod turn;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{TdError, TdResult};
pub use ids::{IntersectionId, LaneId, RoadId, VehicleClassId, VehicleSpecId};
pub use rng::SimRng;
pub use time::{RunConfig, SimClock, Tick, TickMode};
pub use turn::{TurnAction, TurnDirection, TurnSet, TurnWeights};
pub use vehicle::{VehicleCatalog, VehicleSpec};
