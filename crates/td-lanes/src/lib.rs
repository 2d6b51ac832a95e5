//! `td-lanes` — the road/lane model the scheduler consults, and destination
//! selection.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`model`]       | `LaneModel` trait (road lookup, eligibility, congestion)  |
//! | [`network`]     | `LaneNetwork` (CSR lanes per road), `LaneNetworkBuilder`  |
//! | [`destination`] | `DestinationSelector` trait, `TurnTable`                  |
//! | [`error`]       | `LaneError`, `LaneResult<T>`                              |

pub mod destination;
pub mod error;
pub mod model;
pub mod network;

#[cfg(test)]
mod tests;

pub use destination::{DestinationSelector, TurnTable};
pub use error::{LaneError, LaneResult};
pub use model::LaneModel;
pub use network::{LaneNetwork, LaneNetworkBuilder};
