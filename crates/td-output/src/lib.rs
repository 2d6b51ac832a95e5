//! `td-output` — spawn and diagnostics writers for the rust_td scheduler.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                                                |
//! |-----------|---------|--------------------------------------------------------------|
//! | *(none)*  | CSV     | `spawns.csv`, `tick_summaries.csv`, `lateness.csv`           |
//! | `sqlite`  | SQLite  | `output.db`                                                  |
//! | `parquet` | Parquet | `spawns.parquet`, `tick_summaries.parquet`, `lateness.parquet` |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`SpawnOutputObserver`], which implements `td_sched::SchedulerObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use td_output::{CsvWriter, SpawnOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SpawnOutputObserver::new(writer);
//! driver.run(&lanes, &mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SpawnOutputObserver;
pub use row::{LatenessRow, NO_DESTINATION, SpawnRow, TickSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
