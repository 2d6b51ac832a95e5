//! `DemandWindow` — converts buckets into timed events as the clock passes
//! them.
//!
//! # Watermark
//!
//! Buckets are expanded in index order, all roads at once, and never twice.
//! The watermark is the highest expanded index (`None` before the first
//! advance).  Events left in a road's queue when the next bucket is expanded
//! are *held over*: they stay at the front, untouched, and the new bucket's
//! events are appended behind them.
//!
//! # Conservation
//!
//! ```text
//! scheduled − dispatched == Σ queue lengths
//! ```
//!
//! checked after every expanded bucket.  A violation is a scheduler bug and
//! is returned as [`SchedError::ConservationViolated`].

use td_core::{RoadId, SimRng, TurnWeights};
use td_demand::{DemandTable, ScheduledEvent, SpawnQueue};

use crate::{SchedError, SchedResult};

#[derive(Clone, Debug)]
pub struct DemandWindow<'a> {
    table:      &'a DemandTable,
    /// One queue per road slot of `table`.
    queues:     Vec<SpawnQueue>,
    weights:    TurnWeights,
    watermark:  Option<usize>,
    scheduled:  u64,
    dispatched: u64,
    next_seq:   u64,
}

impl<'a> DemandWindow<'a> {
    pub fn new(table: &'a DemandTable, weights: TurnWeights) -> Self {
        Self {
            table,
            queues:     vec![SpawnQueue::new(); table.road_count()],
            weights,
            watermark:  None,
            scheduled:  0,
            dispatched: 0,
            next_seq:   0,
        }
    }

    #[inline]
    pub fn table(&self) -> &'a DemandTable {
        self.table
    }

    /// Highest expanded bucket index.
    #[inline]
    pub fn watermark(&self) -> Option<usize> {
        self.watermark
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    /// Index of the bucket containing `t`, never below the watermark.
    pub fn locate_bucket_index(&self, t: f64) -> Option<usize> {
        self.table.locate(t, self.watermark.unwrap_or(0))
    }

    /// Expand every bucket that has started by `now`.
    ///
    /// The target is the bucket containing `now`; if `now` falls in a gap or
    /// past the end of the table, it is the last bucket that has started.
    /// Buckets a large tick jumped over are therefore still expanded.
    pub fn ensure(&mut self, now: f64, rng: &mut SimRng) -> SchedResult<()> {
        let target = self
            .locate_bucket_index(now)
            .or_else(|| self.table.last_started(now));
        match target {
            Some(t) if self.watermark.is_none_or(|w| t > w) => self.advance_to(t, rng),
            _ => Ok(()),
        }
    }

    // ── Expansion ─────────────────────────────────────────────────────────

    /// Expand buckets `watermark + 1 ..= target` on every road.
    ///
    /// For each bucket and road, draws `total` spawn times uniformly from the
    /// bucket interval, sorts them, and pairs each with an action drawn
    /// without replacement from the bucket's action pool.
    pub fn advance_to(&mut self, target: usize, rng: &mut SimRng) -> SchedResult<()> {
        let first = self.watermark.map_or(0, |w| w + 1);
        let last = target.min(self.table.bucket_count().saturating_sub(1));
        if self.table.bucket_count() == 0 || first > last {
            return Ok(());
        }

        for index in first..=last {
            let start = self.table.start_secs(index);
            let duration = self.table.duration_secs(index);
            let mut added = 0u64;

            for (slot, queue) in self.queues.iter_mut().enumerate() {
                let road = self.table.roads()[slot];
                let bucket = &self.table.buckets_at(slot)[index];
                let new_count = bucket.total();
                if new_count == 0 {
                    continue;
                }

                let mut times: Vec<f64> = (0..new_count)
                    .map(|_| rng.uniform_secs(start, duration))
                    .collect();
                times.sort_by(f64::total_cmp);

                let mut pool = bucket.action_pool();
                for spawn_secs in times {
                    if pool.is_empty() {
                        log::error!("action pool for {road} exhausted in bucket {index}");
                        return Err(SchedError::EmptyActionPool { road, bucket: index });
                    }
                    let action = pool.swap_remove(rng.gen_range(0..pool.len()));
                    let event = ScheduledEvent::new(spawn_secs, action, &self.weights, rng, self.next_seq);
                    self.next_seq += 1;
                    queue.push_back(event);
                }
                added += new_count;
            }

            self.scheduled += added;
            self.watermark = Some(index);
            log::debug!(
                "window advanced to bucket {index} [{start}s, {}s): +{added} events, {} pending",
                start + duration,
                self.pending()
            );
            self.check_conservation()?;
        }
        Ok(())
    }

    // ── Queues ────────────────────────────────────────────────────────────

    pub fn queue(&self, road: RoadId) -> Option<&SpawnQueue> {
        self.table.road_slot(road).map(|slot| &self.queues[slot])
    }

    pub fn queue_mut(&mut self, road: RoadId) -> Option<&mut SpawnQueue> {
        self.table.road_slot(road).map(|slot| &mut self.queues[slot])
    }

    /// Count one event as dispatched.  Call once per event removed from a
    /// queue.
    #[inline]
    pub fn record_dispatch(&mut self) {
        self.dispatched += 1;
    }

    // ── Diagnostics ───────────────────────────────────────────────────────

    #[inline]
    pub fn scheduled(&self) -> u64 {
        self.scheduled
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Events currently queued across all roads.
    pub fn pending(&self) -> u64 {
        self.queues.iter().map(|q| q.len() as u64).sum()
    }

    pub fn check_conservation(&self) -> SchedResult<()> {
        let pending = self.pending();
        let holds = self
            .scheduled
            .checked_sub(self.dispatched)
            .is_some_and(|outstanding| outstanding == pending);
        if holds {
            return Ok(());
        }
        log::error!(
            "conservation violated: scheduled {} dispatched {} pending {pending}",
            self.scheduled,
            self.dispatched
        );
        Err(SchedError::ConservationViolated {
            scheduled:  self.scheduled,
            dispatched: self.dispatched,
            pending,
        })
    }
}
