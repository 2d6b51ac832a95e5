//! Parquet output backend (feature `parquet`).
//!
//! Creates three files in the configured output directory:
//! - `spawns.parquet`
//! - `tick_summaries.parquet`
//! - `lateness.parquet`

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, StringBuilder, UInt16Builder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{LatenessRow, NO_DESTINATION, OutputResult, SpawnRow, TickSummaryRow};

fn spawn_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tick",        DataType::UInt64,  false),
        Field::new("spawn_secs",  DataType::Float64, false),
        Field::new("lane",        DataType::UInt32,  false),
        Field::new("road",        DataType::UInt32,  false),
        Field::new("direction",   DataType::Utf8,    false),
        Field::new("vehicle",     DataType::UInt16,  false),
        Field::new("class",       DataType::UInt16,  false),
        Field::new("destination", DataType::UInt32,  true),
    ]))
}

fn summary_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tick",       DataType::UInt64,  false),
        Field::new("now_secs",   DataType::Float64, false),
        Field::new("spawned",    DataType::UInt64,  false),
        Field::new("scheduled",  DataType::UInt64,  false),
        Field::new("dispatched", DataType::UInt64,  false),
        Field::new("pending",    DataType::UInt64,  false),
        Field::new("late",       DataType::UInt64,  false),
    ]))
}

fn lateness_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tick",          DataType::UInt64,  false),
        Field::new("lane",          DataType::UInt32,  false),
        Field::new("road",          DataType::UInt32,  false),
        Field::new("direction",     DataType::Utf8,    false),
        Field::new("spawn_secs",    DataType::Float64, false),
        Field::new("dispatch_secs", DataType::Float64, false),
        Field::new("delay_secs",    DataType::Float64, false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

fn open(dir: &Path, name: &str, schema: &Arc<Schema>) -> OutputResult<ArrowWriter<File>> {
    let file = File::create(dir.join(name))?;
    Ok(ArrowWriter::try_new(file, Arc::clone(schema), Some(snappy_props()))?)
}

/// Writes scheduler output to three Parquet files.
///
/// `finish()` **must** be called to write the Parquet file footers; files
/// written without calling `finish()` cannot be opened by Parquet readers.
pub struct ParquetWriter {
    spawns:        Option<ArrowWriter<File>>,
    summaries:     Option<ArrowWriter<File>>,
    lateness:      Option<ArrowWriter<File>>,
    spawn_schema:  Arc<Schema>,
    summ_schema:   Arc<Schema>,
    late_schema:   Arc<Schema>,
}

impl ParquetWriter {
    /// Create the Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let spawn_schema = spawn_schema();
        let summ_schema = summary_schema();
        let late_schema = lateness_schema();

        Ok(Self {
            spawns:    Some(open(dir, "spawns.parquet", &spawn_schema)?),
            summaries: Some(open(dir, "tick_summaries.parquet", &summ_schema)?),
            lateness:  Some(open(dir, "lateness.parquet", &late_schema)?),
            spawn_schema,
            summ_schema,
            late_schema,
        })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_spawns(&mut self, rows: &[SpawnRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.spawns.as_mut() else {
            return Ok(());
        };

        let mut ticks        = UInt64Builder::new();
        let mut spawn_secs   = Float64Builder::new();
        let mut lanes        = UInt32Builder::new();
        let mut roads        = UInt32Builder::new();
        let mut directions   = StringBuilder::new();
        let mut vehicles     = UInt16Builder::new();
        let mut classes      = UInt16Builder::new();
        let mut destinations = UInt32Builder::new();

        for row in rows {
            ticks.append_value(row.tick);
            spawn_secs.append_value(row.spawn_secs);
            lanes.append_value(row.lane);
            roads.append_value(row.road);
            directions.append_value(row.direction.as_str());
            vehicles.append_value(row.vehicle);
            classes.append_value(row.class);
            destinations.append_option((row.destination != NO_DESTINATION).then_some(row.destination));
        }

        let columns: Vec<ArrayRef> = vec![
            Arc::new(ticks.finish()),
            Arc::new(spawn_secs.finish()),
            Arc::new(lanes.finish()),
            Arc::new(roads.finish()),
            Arc::new(directions.finish()),
            Arc::new(vehicles.finish()),
            Arc::new(classes.finish()),
            Arc::new(destinations.finish()),
        ];
        let batch = RecordBatch::try_new(Arc::clone(&self.spawn_schema), columns)?;
        writer.write(&batch)?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        let Some(writer) = self.summaries.as_mut() else {
            return Ok(());
        };

        let column = |v: u64| -> ArrayRef {
            let mut b = UInt64Builder::new();
            b.append_value(v);
            Arc::new(b.finish())
        };
        let mut now = Float64Builder::new();
        now.append_value(row.now_secs);

        let batch = RecordBatch::try_new(
            Arc::clone(&self.summ_schema),
            vec![
                column(row.tick),
                Arc::new(now.finish()),
                column(row.spawned),
                column(row.scheduled),
                column(row.dispatched),
                column(row.pending),
                column(row.late),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn write_lateness(&mut self, rows: &[LatenessRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.lateness.as_mut() else {
            return Ok(());
        };

        let mut ticks      = UInt64Builder::new();
        let mut lanes      = UInt32Builder::new();
        let mut roads      = UInt32Builder::new();
        let mut directions = StringBuilder::new();
        let mut spawns     = Float64Builder::new();
        let mut dispatches = Float64Builder::new();
        let mut delays     = Float64Builder::new();

        for row in rows {
            ticks.append_value(row.tick);
            lanes.append_value(row.lane);
            roads.append_value(row.road);
            directions.append_value(row.direction.as_str());
            spawns.append_value(row.spawn_secs);
            dispatches.append_value(row.dispatch_secs);
            delays.append_value(row.delay_secs);
        }

        let columns: Vec<ArrayRef> = vec![
            Arc::new(ticks.finish()),
            Arc::new(lanes.finish()),
            Arc::new(roads.finish()),
            Arc::new(directions.finish()),
            Arc::new(spawns.finish()),
            Arc::new(dispatches.finish()),
            Arc::new(delays.finish()),
        ];
        let batch = RecordBatch::try_new(Arc::clone(&self.late_schema), columns)?;
        writer.write(&batch)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        for slot in [&mut self.spawns, &mut self.summaries, &mut self.lateness] {
            if let Some(w) = slot.take() {
                w.close()?;
            }
        }
        Ok(())
    }
}
