//! The `OutputWriter` trait implemented by all backend writers.

use crate::{LatenessRow, OutputResult, SpawnRow, TickSummaryRow};

/// Trait implemented by CSV, SQLite, and Parquet writers.
///
/// Errors are returned here; [`SpawnOutputObserver`](crate::SpawnOutputObserver)
/// keeps the first one for [`take_error`](crate::SpawnOutputObserver::take_error).
pub trait OutputWriter {
    /// Write a batch of spawn requests.
    fn write_spawns(&mut self, rows: &[SpawnRow]) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Write a batch of late dispatches.
    fn write_lateness(&mut self, rows: &[LatenessRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
