//! Four-leg signalised junction used by the corridor demo.
//!
//! Approaches are roads 0–3 (S, E, N, W) and match the road numbers in the
//! demand CSV; exits are roads 4–7 (S, E, N, W).  Every approach has three
//! lanes: a left-turn pocket, a through lane, and a shared through/right
//! curb lane.

use td_core::{IntersectionId, LaneId, RoadId, TurnDirection, TurnSet};
use td_lanes::{LaneNetwork, LaneNetworkBuilder, LaneResult, TurnTable};

const APPROACH_LENGTH_M: f32 = 120.0;

pub struct Junction {
    pub lanes:   LaneNetwork,
    pub turns:   TurnTable,
    /// `[pocket, through, curb]` for each approach.
    pub entries: Vec<[LaneId; 3]>,
}

pub fn build_junction() -> LaneResult<Junction> {
    use TurnDirection::*;

    let junction = IntersectionId(0);
    let mut b = LaneNetworkBuilder::new();

    let approaches: Vec<RoadId> = (0..4).map(|_| b.add_road(junction)).collect();
    // Exits lead away from the junction into intersections outside the demo.
    let exits: Vec<RoadId> = (1..=4).map(|i| b.add_road(IntersectionId(i))).collect();

    let mut entries = Vec::with_capacity(approaches.len());
    for &road in &approaches {
        entries.push([
            b.add_lane(road, APPROACH_LENGTH_M, TurnSet::of(&[Left]))?,
            b.add_lane(road, APPROACH_LENGTH_M, TurnSet::of(&[Straight]))?,
            b.add_lane(road, APPROACH_LENGTH_M, TurnSet::of(&[Straight, Right]))?,
        ]);
    }
    for &exit in &exits {
        b.add_lane(exit, APPROACH_LENGTH_M, TurnSet::ALL)?;
    }

    // Straight through leads to the opposite leg.
    let mut turns = TurnTable::new();
    for (i, &road) in approaches.iter().enumerate() {
        turns.connect(road, Left, exits[(i + 3) % 4]);
        turns.connect(road, Straight, exits[(i + 2) % 4]);
        turns.connect(road, Right, exits[(i + 1) % 4]);
    }

    Ok(Junction { lanes: b.build(), turns, entries })
}
