//! `td-demand` — turn-movement demand tables, spawn events, and CSV loading.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`bucket`]  | `TimeBucket` — one road's counts for one interval          |
//! | [`table`]   | `DemandTable` — aligned buckets + cumulative totals        |
//! | [`event`]   | `ScheduledEvent` — (spawn time, concrete direction)        |
//! | [`queue`]   | `SpawnQueue` — per-road time-ordered FIFO of events        |
//! | [`loader`]  | `load_demand_csv`, `load_demand_reader`, `LoadOptions`     |
//! | [`error`]   | `DemandError`, `DemandResult<T>`                           |
//!
//! # Alignment model (summary)
//!
//! Every road in a `DemandTable` has the same number of buckets, and bucket
//! `i` spans the same `[start, start + duration)` interval on every road:
//!
//! ```text
//! cum_before[i]  = Σ totals of buckets 0 .. i     (all roads)
//! cum_through[i] = Σ totals of buckets 0 ..= i    (all roads)
//! ```
//!
//! The scheduler's window advances bucket index by bucket index across all
//! roads at once, so alignment is what makes a single watermark sufficient.

pub mod bucket;
pub mod error;
pub mod event;
pub mod loader;
pub mod queue;
pub mod table;


pub use bucket::TimeBucket;
pub use error::{DemandError, DemandResult};
pub use event::ScheduledEvent;
pub use loader::{LoadOptions, load_demand_csv, load_demand_reader};
pub use queue::SpawnQueue;
pub use table::DemandTable;
