//! Destination selection.
//!
//! # Pluggability
//!
//! The scheduler asks a [`DestinationSelector`] where each dispatched vehicle
//! should head once it has performed its turn.  Applications with a real
//! route model implement the trait themselves; [`TurnTable`] is a static
//! lookup of the roads reachable by each (road, turn) movement.

use rustc_hash::FxHashMap;

use td_core::{RoadId, SimRng, TurnDirection};

// ── DestinationSelector trait ─────────────────────────────────────────────────

pub trait DestinationSelector {
    /// The road a vehicle on `road` performing `turn` heads to, or `None`
    /// if the movement leads nowhere known.
    fn select_destination(
        &self,
        road: RoadId,
        turn: TurnDirection,
        rng:  &mut SimRng,
    ) -> Option<RoadId>;
}

// ── TurnTable ─────────────────────────────────────────────────────────────────

/// Static movement table: `(road, turn) → candidate exit roads`.
///
/// With several candidates (e.g. a straight movement that may continue onto
/// two downstream roads) one is chosen uniformly.
#[derive(Clone, Debug, Default)]
pub struct TurnTable {
    exits: FxHashMap<(RoadId, TurnDirection), Vec<RoadId>>,
}

impl TurnTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `exit` as reachable from `road` by `turn`.  Duplicates are
    /// ignored.
    pub fn connect(&mut self, road: RoadId, turn: TurnDirection, exit: RoadId) {
        let exits = self.exits.entry((road, turn)).or_default();
        if !exits.contains(&exit) {
            exits.push(exit);
        }
    }

    /// Exit roads registered for `(road, turn)`.
    pub fn exits(&self, road: RoadId, turn: TurnDirection) -> &[RoadId] {
        self.exits.get(&(road, turn)).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.exits.is_empty()
    }
}

impl DestinationSelector for TurnTable {
    fn select_destination(
        &self,
        road: RoadId,
        turn: TurnDirection,
        rng:  &mut SimRng,
    ) -> Option<RoadId> {
        match self.exits(road, turn) {
            [] => None,
            [only] => Some(*only),
            many => rng.choose(many).copied(),
        }
    }
}
