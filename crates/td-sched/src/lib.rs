//! `td-sched` — demand window, spawn schedulers, and the tick driver loop.
//!
//! # Per-call flow
//!
//! ```text
//! act(lanes, spawn_point, tick_secs[, class]):
//!   ① Tick      — TickTracker decides whether a new tick began; the clock
//!                 (end of the current tick) advances by tick_secs if so.
//!   ② Road      — LaneModel::road_of(spawn_point).
//!   ③ Window    — DemandWindow::ensure(clock): expand every bucket that has
//!                 started into timed events on every road's queue.
//!   ④ Dispatch  — plain:      pop the road's head if due.
//!                 restricted: claim the first due event the lane is
//!                             eligible for (at most one per lane per tick).
//!   ⑤ Emit      — one SpawnRequest per matching vehicle spec, shuffled.
//! ```
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`window`]     | `DemandWindow` — watermark, queues, conservation          |
//! | [`scheduler`]  | `SpawnScheduler` trait, `DemandScheduler`                 |
//! | [`restricted`] | `RestrictedDemandScheduler`, `LanePolicy`                 |
//! | [`tick`]       | `TickTracker` — implicit / explicit tick boundaries       |
//! | [`cache`]      | `EligibilityCache`, `EligibilityKey`                      |
//! | [`lateness`]   | `LatenessLog`, `LatenessRecord`                           |
//! | [`request`]    | `SpawnRequest`                                            |
//! | [`builder`]    | `SchedulerBuilder`                                        |
//! | [`observer`]   | `SchedulerObserver`, `NoopObserver`, `TickStats`          |
//! | [`driver`]     | `SpawnLoop`, `SpawnPoint`                                 |
//! | [`error`]      | `SchedError`, `SchedResult<T>`                            |
//!
//! # Concurrency
//!
//! Single-threaded and synchronous.  A scheduler may be moved between
//! threads but must never be shared; nothing inside is locked.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use td_sched::{NoopObserver, SchedulerBuilder, SpawnLoop, SpawnPoint};
//!
//! let sched = SchedulerBuilder::new(&table, catalog, turns)
//!     .config(&config)
//!     .build_restricted(&lanes)?;
//! let mut driver = SpawnLoop::new(config, sched, spawn_points)?;
//! driver.run(&lanes, &mut NoopObserver)?;
//! ```

pub mod builder;
pub mod cache;
pub mod driver;
pub mod error;
pub mod lateness;
pub mod observer;
pub mod request;
pub mod restricted;
pub mod scheduler;
pub mod tick;
pub mod window;

#[cfg(test)]
mod tests;

pub use builder::SchedulerBuilder;
pub use cache::{EligibilityCache, EligibilityKey};
pub use driver::{SpawnLoop, SpawnPoint};
pub use error::{SchedError, SchedResult};
pub use lateness::{LatenessLog, LatenessRecord};
pub use observer::{NoopObserver, RunSummary, SchedulerObserver, TickStats};
pub use request::SpawnRequest;
pub use restricted::{LanePolicy, RestrictedDemandScheduler};
pub use scheduler::{DemandScheduler, SpawnScheduler};
pub use tick::TickTracker;
pub use window::DemandWindow;
