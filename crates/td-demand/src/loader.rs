//! CSV demand loader.
//!
//! # CSV format
//!
//! One row per time bucket, shared by every road, so the loaded table is
//! aligned by construction.
//!
//! ```csv
//! time,0:left,0:straight,0:right,0:total,1:straight_or_left,1:total
//! 00:00,2,5,1,8,3,3
//! 00:15,0,4,2,6,1,1
//! ```
//!
//! | Column            | Meaning                                                |
//! |-------------------|--------------------------------------------------------|
//! | `time`            | bucket start: seconds (`90`, `90.5`) or `HH:MM[:SS]`    |
//! | `<road>:<action>` | vehicles on road `<road>` performing `<action>`        |
//! | `<road>:total`    | optional check column; must equal the road's row sum   |
//!
//! `<road>` is a `RoadId` (u32); `<action>` is any label accepted by
//! `TurnAction::from_str`.  Empty count cells read as 0.
//!
//! Bucket starts are `time − first_time + time_offset_secs`.  Each bucket
//! ends where the next row starts.  The last bucket ends at
//! [`LoadOptions::end_secs`] if set, otherwise it reuses the previous row's
//! interval.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use td_core::{RoadId, TurnAction};

use crate::{DemandError, DemandResult, DemandTable, TimeBucket};

/// Ingestion knobs.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadOptions {
    /// Shift applied to every bucket start.  Must not be negative.
    #[cfg_attr(feature = "serde", serde(default))]
    pub time_offset_secs: f64,
    /// End of the last bucket, in seconds since the demand epoch (after the
    /// offset is applied).  Required for single-row files.
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_secs: Option<f64>,
}

// ── Header model ──────────────────────────────────────────────────────────────

enum Column {
    Count(RoadId, TurnAction),
    Total(RoadId),
}

fn parse_header(name: &str) -> DemandResult<Column> {
    let (road, what) = name.split_once(':').ok_or_else(|| {
        DemandError::Parse(format!("column {name:?}: expected \"<road>:<action>\""))
    })?;
    let road = road
        .trim()
        .parse::<u32>()
        .map(RoadId)
        .map_err(|_| DemandError::Parse(format!("column {name:?}: road must be a u32")))?;
    if what.trim().eq_ignore_ascii_case("total") {
        return Ok(Column::Total(road));
    }
    Ok(Column::Count(road, what.parse::<TurnAction>()?))
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`DemandTable`] from a CSV file.
pub fn load_demand_csv(path: &Path, options: &LoadOptions) -> DemandResult<DemandTable> {
    let file = std::fs::File::open(path)?;
    load_demand_reader(file, options)
}

/// Like [`load_demand_csv`] but accepts any `Read` source.
pub fn load_demand_reader<R: Read>(reader: R, options: &LoadOptions) -> DemandResult<DemandTable> {
    if !(options.time_offset_secs.is_finite() && options.time_offset_secs >= 0.0) {
        return Err(DemandError::NegativeOffset(options.time_offset_secs));
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    // ── Parse header ──────────────────────────────────────────────────────
    let headers = csv_reader
        .headers()
        .map_err(|e| DemandError::Parse(e.to_string()))?
        .clone();
    match headers.get(0) {
        Some(h) if h.eq_ignore_ascii_case("time") => {}
        other => {
            return Err(DemandError::Parse(format!(
                "first column must be \"time\", got {other:?}"
            )));
        }
    }

    let mut columns = Vec::with_capacity(headers.len().saturating_sub(1));
    let mut has_total: BTreeMap<RoadId, bool> = BTreeMap::new();
    for name in headers.iter().skip(1) {
        let column = parse_header(name)?;
        match column {
            Column::Total(road) => {
                if has_total.insert(road, true) == Some(true) {
                    return Err(DemandError::Parse(format!("duplicate total column for {road}")));
                }
            }
            Column::Count(road, _) => {
                has_total.entry(road).or_insert(false);
            }
        }
        columns.push(column);
    }

    // ── One open bucket per road per row ──────────────────────────────────
    let mut per_road: BTreeMap<RoadId, Vec<TimeBucket>> =
        has_total.keys().map(|&r| (r, Vec::new())).collect();
    let mut first_time: Option<f64> = None;
    let mut prev_start: Option<f64> = None;
    let mut last_interval: Option<f64> = None;

    for result in csv_reader.records() {
        let record = result.map_err(|e| DemandError::Parse(e.to_string()))?;
        let raw_time = parse_time(record.get(0).unwrap_or(""))?;
        let first = *first_time.get_or_insert(raw_time);
        let start = raw_time - first + options.time_offset_secs;

        if let Some(prev) = prev_start {
            if start <= prev {
                return Err(DemandError::Parse(format!(
                    "times must be strictly increasing: {start}s follows {prev}s"
                )));
            }
            last_interval = Some(start - prev);
            for buckets in per_road.values_mut() {
                if let Some(open) = buckets.last_mut() {
                    open.close(start)?;
                }
            }
        }
        prev_start = Some(start);

        for buckets in per_road.values_mut() {
            buckets.push(TimeBucket::new(start)?);
        }

        let mut declared: BTreeMap<RoadId, u64> = BTreeMap::new();
        for (column, cell) in columns.iter().zip(record.iter().skip(1)) {
            match *column {
                Column::Count(road, action) => {
                    let n = parse_count(cell)?;
                    if let Some(bucket) = per_road.get_mut(&road).and_then(|b| b.last_mut()) {
                        bucket.add_count(action, n)?;
                    }
                }
                Column::Total(road) => {
                    declared.insert(road, parse_count(cell)? as u64);
                }
            }
        }
        for (road, declared) in declared {
            let actual = per_road
                .get(&road)
                .and_then(|b| b.last())
                .map_or(0, TimeBucket::total);
            if actual != declared {
                return Err(DemandError::TotalMismatch { road, start, declared, actual });
            }
        }
    }

    // ── Close the last bucket ─────────────────────────────────────────────
    if let Some(last_start) = prev_start {
        let end = match (options.end_secs, last_interval) {
            (Some(end), _) => end,
            (None, Some(interval)) => last_start + interval,
            (None, None) => {
                let road = per_road.keys().next().copied().unwrap_or(RoadId::INVALID);
                return Err(DemandError::Unbounded { road, start: last_start });
            }
        };
        for buckets in per_road.values_mut() {
            if let Some(open) = buckets.last_mut() {
                open.close(end)?;
            }
        }
    }

    DemandTable::build(per_road)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Seconds, or `HH:MM[:SS]` clock time.
fn parse_time(s: &str) -> DemandResult<f64> {
    let bad = || DemandError::Parse(format!("invalid time {s:?}: expected seconds or HH:MM[:SS]"));
    if !s.contains(':') {
        let secs = s.parse::<f64>().map_err(|_| bad())?;
        if !(secs.is_finite() && secs >= 0.0) {
            return Err(DemandError::NegativeOffset(secs));
        }
        return Ok(secs);
    }
    let parts: Vec<&str> = s.split(':').collect();
    let (h, m, sec) = match parts.as_slice() {
        [h, m] => (*h, *m, "0"),
        [h, m, sec] => (*h, *m, *sec),
        _ => return Err(bad()),
    };
    let h = h.parse::<u32>().map_err(|_| bad())?;
    let m = m.parse::<u32>().map_err(|_| bad())?;
    let sec = sec.parse::<f64>().map_err(|_| bad())?;
    if m >= 60 || !(0.0..60.0).contains(&sec) {
        return Err(bad());
    }
    Ok(h as f64 * 3_600.0 + m as f64 * 60.0 + sec)
}

fn parse_count(s: &str) -> DemandResult<u32> {
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<u32>()
        .map_err(|_| DemandError::Parse(format!("invalid count {s:?}: expected a non-negative integer")))
}
