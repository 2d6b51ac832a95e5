//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `spawns`, `tick_summaries`, and `lateness`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{LatenessRow, OutputResult, SpawnRow, TickSummaryRow};

/// Writes scheduler output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS spawns (
                 tick        INTEGER NOT NULL,
                 spawn_secs  REAL    NOT NULL,
                 lane        INTEGER NOT NULL,
                 road        INTEGER NOT NULL,
                 direction   TEXT    NOT NULL,
                 vehicle     INTEGER NOT NULL,
                 class       INTEGER NOT NULL,
                 destination INTEGER
             );
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 tick       INTEGER PRIMARY KEY,
                 now_secs   REAL    NOT NULL,
                 spawned    INTEGER NOT NULL,
                 scheduled  INTEGER NOT NULL,
                 dispatched INTEGER NOT NULL,
                 pending    INTEGER NOT NULL,
                 late       INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS lateness (
                 tick          INTEGER NOT NULL,
                 lane          INTEGER NOT NULL,
                 road          INTEGER NOT NULL,
                 direction     TEXT    NOT NULL,
                 spawn_secs    REAL    NOT NULL,
                 dispatch_secs REAL    NOT NULL,
                 delay_secs    REAL    NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_spawns(&mut self, rows: &[SpawnRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO spawns \
                 (tick, spawn_secs, lane, road, direction, vehicle, class, destination) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                // No destination is stored as NULL.
                let destination = (row.destination != crate::NO_DESTINATION).then_some(row.destination);
                stmt.execute(rusqlite::params![
                    row.tick as i64,
                    row.spawn_secs,
                    row.lane,
                    row.road,
                    row.direction.as_str(),
                    row.vehicle,
                    row.class,
                    destination,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries \
             (tick, now_secs, spawned, scheduled, dispatched, pending, late) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                row.tick as i64,
                row.now_secs,
                row.spawned as i64,
                row.scheduled as i64,
                row.dispatched as i64,
                row.pending as i64,
                row.late as i64,
            ],
        )?;
        Ok(())
    }

    fn write_lateness(&mut self, rows: &[LatenessRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO lateness \
                 (tick, lane, road, direction, spawn_secs, dispatch_secs, delay_secs) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.tick as i64,
                    row.lane,
                    row.road,
                    row.direction.as_str(),
                    row.spawn_secs,
                    row.dispatch_secs,
                    row.delay_secs,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
