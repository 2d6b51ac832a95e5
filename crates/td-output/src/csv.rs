//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `spawns.csv`
//! - `tick_summaries.csv`
//! - `lateness.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{LatenessRow, OutputResult, SpawnRow, TickSummaryRow};

/// Writes scheduler output to three CSV files.
pub struct CsvWriter {
    spawns:    Writer<File>,
    summaries: Writer<File>,
    lateness:  Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut spawns = Writer::from_path(dir.join("spawns.csv"))?;
        spawns.write_record([
            "tick", "spawn_secs", "lane", "road", "direction", "vehicle", "class", "destination",
        ])?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record([
            "tick", "now_secs", "spawned", "scheduled", "dispatched", "pending", "late",
        ])?;

        let mut lateness = Writer::from_path(dir.join("lateness.csv"))?;
        lateness.write_record([
            "tick", "lane", "road", "direction", "spawn_secs", "dispatch_secs", "delay_secs",
        ])?;

        Ok(Self {
            spawns,
            summaries,
            lateness,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_spawns(&mut self, rows: &[SpawnRow]) -> OutputResult<()> {
        for row in rows {
            self.spawns.write_record(&[
                row.tick.to_string(),
                format!("{:.3}", row.spawn_secs),
                row.lane.to_string(),
                row.road.to_string(),
                row.direction.as_str().to_owned(),
                row.vehicle.to_string(),
                row.class.to_string(),
                row.destination.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.now_secs.to_string(),
            row.spawned.to_string(),
            row.scheduled.to_string(),
            row.dispatched.to_string(),
            row.pending.to_string(),
            row.late.to_string(),
        ])?;
        Ok(())
    }

    fn write_lateness(&mut self, rows: &[LatenessRow]) -> OutputResult<()> {
        for row in rows {
            self.lateness.write_record(&[
                row.tick.to_string(),
                row.lane.to_string(),
                row.road.to_string(),
                row.direction.as_str().to_owned(),
                format!("{:.3}", row.spawn_secs),
                row.dispatch_secs.to_string(),
                format!("{:.3}", row.delay_secs),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.spawns.flush()?;
        self.summaries.flush()?;
        self.lateness.flush()?;
        Ok(())
    }
}
