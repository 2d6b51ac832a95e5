//! `SpawnOutputObserver<W>` — bridges `SchedulerObserver` to an
//! `OutputWriter`.

use td_core::Tick;
use td_sched::{LatenessRecord, RunSummary, SchedulerObserver, SpawnRequest, TickStats};

use crate::row::{LatenessRow, SpawnRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SchedulerObserver`] that writes spawns, tick summaries, and late
/// dispatches to any [`OutputWriter`] backend (CSV, SQLite, Parquet, …).
///
/// Spawns and lateness records are buffered for the current tick and
/// written as one batch when the tick ends.  Errors from the writer are
/// stored internally because observer methods have no return value.  After
/// `driver.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SpawnOutputObserver<W: OutputWriter> {
    writer:     W,
    spawns:     Vec<SpawnRow>,
    late:       Vec<LatenessRow>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SpawnOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            spawns:     Vec::new(),
            late:       Vec::new(),
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after `driver.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }

    fn flush_tick(&mut self) {
        if !self.spawns.is_empty() {
            let result = self.writer.write_spawns(&self.spawns);
            self.spawns.clear();
            self.store_err(result);
        }
        if !self.late.is_empty() {
            let result = self.writer.write_lateness(&self.late);
            self.late.clear();
            self.store_err(result);
        }
    }
}

impl<W: OutputWriter> SchedulerObserver for SpawnOutputObserver<W> {
    fn on_spawn(&mut self, tick: Tick, request: &SpawnRequest) {
        self.spawns.push(SpawnRow::new(tick, request));
    }

    fn on_late(&mut self, tick: Tick, record: &LatenessRecord) {
        self.late.push(LatenessRow::new(tick, record));
    }

    fn on_tick_end(&mut self, _stats: &TickStats) {
        self.flush_tick();
    }

    fn on_summary(&mut self, stats: &TickStats) {
        let result = self.writer.write_tick_summary(&TickSummaryRow::from(stats));
        self.store_err(result);
    }

    fn on_run_end(&mut self, _summary: &RunSummary) {
        self.flush_tick();
        let result = self.writer.finish();
        self.store_err(result);
    }
}
