//! `DemandTable` — aligned per-road bucket sequences with cumulative totals.
//!
//! # Data layout
//!
//! Roads are stored sorted by `RoadId`; `buckets[slot]` is the bucket
//! sequence of `roads[slot]`.  Because every road shares the same bucket
//! boundaries, the boundaries themselves are stored once:
//!
//! ```text
//! starts[i], durations[i]              bucket i on every road
//! cum_before[i]  = Σ_{j <  i} Σ_roads total(j)
//! cum_through[i] = Σ_{j <= i} Σ_roads total(j)
//! ```
//!
//! Lookups by time are `O(log n)` binary searches over `starts`.

use std::collections::BTreeMap;

use td_core::RoadId;

use crate::{DemandError, DemandResult, TimeBucket};

#[derive(Clone, Debug)]
pub struct DemandTable {
    roads:       Vec<RoadId>,
    buckets:     Vec<Vec<TimeBucket>>,
    starts:      Vec<f64>,
    durations:   Vec<f64>,
    cum_before:  Vec<u64>,
    cum_through: Vec<u64>,
    total:       u64,
}

impl DemandTable {
    /// Validate alignment and build the table.
    ///
    /// # Errors
    ///
    /// - [`DemandError::Alignment`] if a road appears twice, bucket counts
    ///   differ across roads, a bucket's offset or duration differs from the
    ///   same index on another road, or buckets overlap / go backwards.
    /// - [`DemandError::Unbounded`] if any bucket was never closed.
    pub fn build<I>(buckets_per_road: I) -> DemandResult<Self>
    where
        I: IntoIterator<Item = (RoadId, Vec<TimeBucket>)>,
    {
        let mut by_road: BTreeMap<RoadId, Vec<TimeBucket>> = BTreeMap::new();
        for (road, buckets) in buckets_per_road {
            if by_road.insert(road, buckets).is_some() {
                return Err(DemandError::Alignment {
                    road,
                    index:  0,
                    reason: "road appears more than once".into(),
                });
            }
        }

        // ── Reference boundaries from the first road ──────────────────────
        let (starts, durations) = match by_road.iter().next() {
            None => (Vec::new(), Vec::new()),
            Some((&road, seq)) => {
                let mut starts = Vec::with_capacity(seq.len());
                let mut durations = Vec::with_capacity(seq.len());
                for (i, b) in seq.iter().enumerate() {
                    if !b.is_closed() {
                        return Err(DemandError::Unbounded { road, start: b.start_secs() });
                    }
                    if let (Some(&s), Some(&d)) = (starts.last(), durations.last()) {
                        let prev_end: f64 = s + d;
                        if b.start_secs() < prev_end {
                            return Err(DemandError::Alignment {
                                road,
                                index:  i,
                                reason: format!(
                                    "bucket starts at {}s, before the previous one ends at {prev_end}s",
                                    b.start_secs()
                                ),
                            });
                        }
                    }
                    starts.push(b.start_secs());
                    durations.push(b.duration_secs());
                }
                (starts, durations)
            }
        };

        // ── Every road must match the reference exactly ───────────────────
        for (&road, seq) in &by_road {
            if seq.len() != starts.len() {
                return Err(DemandError::Alignment {
                    road,
                    index:  seq.len().min(starts.len()),
                    reason: format!("{} buckets, expected {}", seq.len(), starts.len()),
                });
            }
            for (i, b) in seq.iter().enumerate() {
                if !b.is_closed() {
                    return Err(DemandError::Unbounded { road, start: b.start_secs() });
                }
                if b.start_secs() != starts[i] || b.duration_secs() != durations[i] {
                    return Err(DemandError::Alignment {
                        road,
                        index:  i,
                        reason: format!(
                            "[{}, {}) does not match [{}, {})",
                            b.start_secs(),
                            b.end_secs(),
                            starts[i],
                            starts[i] + durations[i]
                        ),
                    });
                }
            }
        }

        // ── Cumulative totals in one linear pass ──────────────────────────
        let n = starts.len();
        let mut cum_before = Vec::with_capacity(n);
        let mut cum_through = Vec::with_capacity(n);
        let mut running = 0u64;
        for i in 0..n {
            cum_before.push(running);
            running += by_road.values().map(|seq| seq[i].total()).sum::<u64>();
            cum_through.push(running);
        }

        let (roads, buckets): (Vec<_>, Vec<_>) = by_road.into_iter().unzip();

        Ok(Self {
            roads,
            buckets,
            starts,
            durations,
            cum_before,
            cum_through,
            total: running,
        })
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    /// Roads with demand, ascending.
    pub fn roads(&self) -> &[RoadId] {
        &self.roads
    }

    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    /// Number of buckets per road.
    pub fn bucket_count(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty() || self.starts.is_empty()
    }

    /// Total vehicles across all roads and buckets.
    pub fn total(&self) -> u64 {
        self.total
    }

    // ── Per-road access ───────────────────────────────────────────────────

    /// Dense slot of `road` in [`roads`](Self::roads), if it has demand.
    pub fn road_slot(&self, road: RoadId) -> Option<usize> {
        self.roads.binary_search(&road).ok()
    }

    pub fn buckets(&self, road: RoadId) -> Option<&[TimeBucket]> {
        self.road_slot(road).map(|slot| self.buckets[slot].as_slice())
    }

    /// Bucket sequence of the road at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= road_count()`.
    pub fn buckets_at(&self, slot: usize) -> &[TimeBucket] {
        &self.buckets[slot]
    }

    // ── Bucket boundaries ─────────────────────────────────────────────────

    #[inline]
    pub fn start_secs(&self, index: usize) -> f64 {
        self.starts[index]
    }

    #[inline]
    pub fn duration_secs(&self, index: usize) -> f64 {
        self.durations[index]
    }

    /// End of the last bucket, or `None` for an empty table.
    pub fn end_secs(&self) -> Option<f64> {
        let last = self.starts.len().checked_sub(1)?;
        Some(self.starts[last] + self.durations[last])
    }

    pub fn cum_before(&self) -> &[u64] {
        &self.cum_before
    }

    pub fn cum_through(&self) -> &[u64] {
        &self.cum_through
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    /// Index of the bucket whose `[start, start + duration)` contains `t`,
    /// searching only buckets at or after `from_index`.
    ///
    /// Returns `None` for negative or non-finite `t`, for `t` in a gap
    /// between buckets, and for `t` past the end.
    pub fn locate(&self, t: f64, from_index: usize) -> Option<usize> {
        if !(t.is_finite() && t >= 0.0) || from_index >= self.starts.len() {
            return None;
        }
        // partition_point returns the first index whose start is > t.
        let pp = self.starts[from_index..].partition_point(|&s| s <= t);
        let idx = (from_index + pp).checked_sub(1)?;
        if idx < from_index {
            return None;
        }
        (t < self.starts[idx] + self.durations[idx]).then_some(idx)
    }

    /// Index of the last bucket that has started by `t` (contains `t` or
    /// ended before it).
    pub fn last_started(&self, t: f64) -> Option<usize> {
        if !(t.is_finite() && t >= 0.0) {
            return None;
        }
        self.starts.partition_point(|&s| s <= t).checked_sub(1)
    }

    /// Vehicles scheduled in all buckets up to and including the one
    /// containing `t`.
    ///
    /// `t < 0` or an empty table → 0; `t` past the end → the grand total.
    pub fn total_scheduled_through(&self, t: f64) -> u64 {
        self.cumulative(t, &self.cum_through)
    }

    /// Vehicles scheduled in all buckets strictly before the one containing
    /// `t`.
    ///
    /// `t < 0` or an empty table → 0; `t` past the end → the grand total.
    pub fn total_scheduled_before(&self, t: f64) -> u64 {
        self.cumulative(t, &self.cum_before)
    }

    fn cumulative(&self, t: f64, cum: &[u64]) -> u64 {
        if self.is_empty() || !(t >= 0.0) {
            return 0;
        }
        match self.locate(t, 0) {
            Some(i) => cum[i],
            // Gap or past the end: everything that has ended is scheduled.
            None => self
                .last_started(t)
                .map_or(0, |i| self.cum_through[i]),
        }
    }
}
