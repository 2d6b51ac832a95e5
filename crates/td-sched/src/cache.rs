//! Eligible-lane cache.
//!
//! Keyed by arena indices, never by collaborator references.  The cache is
//! filled lazily and dropped wholesale when the lane model's restriction
//! epoch moves; the scheduler never evicts on its own.

use rustc_hash::FxHashMap;

use td_core::{IntersectionId, LaneId, RoadId, TurnDirection, VehicleClassId};
use td_lanes::LaneModel;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct EligibilityKey {
    pub intersection: IntersectionId,
    pub road:         RoadId,
    pub class:        VehicleClassId,
    pub direction:    TurnDirection,
}

#[derive(Clone, Debug, Default)]
pub struct EligibilityCache {
    lanes:  FxHashMap<EligibilityKey, Vec<LaneId>>,
    epoch:  Option<u64>,
    misses: u64,
}

impl EligibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry if `epoch` differs from the one the cache was
    /// filled under.
    pub fn sync(&mut self, epoch: u64) {
        if self.epoch != Some(epoch) {
            if !self.lanes.is_empty() {
                log::debug!("lane restrictions changed (epoch {epoch}); dropping {} cached entries", self.lanes.len());
            }
            self.lanes.clear();
            self.epoch = Some(epoch);
        }
    }

    /// Eligible lanes for `key`, asking `model` on a miss.
    pub fn eligible<L: LaneModel>(&mut self, key: EligibilityKey, model: &L) -> &[LaneId] {
        let misses = &mut self.misses;
        self.lanes.entry(key).or_insert_with(|| {
            *misses += 1;
            model.eligible_lanes(key.intersection, key.road, key.class, key.direction)
        })
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of lookups that had to ask the lane model.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}
