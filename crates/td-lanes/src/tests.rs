//! Unit tests for td-lanes.
//!
//! All tests use a hand-crafted network.

#[cfg(test)]
mod helpers {
    use td_core::{IntersectionId, LaneId, RoadId, TurnDirection, TurnSet};

    use crate::{LaneNetwork, LaneNetworkBuilder};

    /// One approach with three lanes into intersection 0, plus a second road
    /// into intersection 1.
    ///
    /// ```text
    ///   lane 0: left only
    ///   lane 1: straight
    ///   lane 2: straight + right
    ///   lane 3: (road 1) any turn
    /// ```
    pub fn approach() -> (LaneNetwork, RoadId, [LaneId; 4]) {
        use TurnDirection::*;
        let mut b = LaneNetworkBuilder::new();
        let r0 = b.add_road(IntersectionId(0));
        let r1 = b.add_road(IntersectionId(1));
        let l0 = b.add_lane(r0, 100.0, TurnSet::of(&[Left])).unwrap();
        let l1 = b.add_lane(r0, 100.0, TurnSet::of(&[Straight])).unwrap();
        // Interleave a lane on another road to exercise CSR grouping.
        let l3 = b.add_lane(r1, 80.0, TurnSet::ALL).unwrap();
        let l2 = b.add_lane(r0, 100.0, TurnSet::of(&[Straight, Right])).unwrap();
        (b.build(), r0, [l0, l1, l2, l3])
    }
}

// ── Builder & network structure ───────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use td_core::{IntersectionId, RoadId, TurnSet};

    use super::helpers::approach;
    use crate::{LaneError, LaneModel, LaneNetworkBuilder};

    #[test]
    fn empty_build() {
        let net = LaneNetworkBuilder::new().build();
        assert_eq!(net.road_count(), 0);
        assert_eq!(net.lane_count(), 0);
        assert!(net.lanes_of(RoadId(0)).is_empty());
    }

    #[test]
    fn lanes_grouped_by_road() {
        let (net, r0, [l0, l1, l2, l3]) = approach();
        assert_eq!(net.lanes_of(r0), &[l0, l1, l2]);
        assert_eq!(net.lanes_of(RoadId(1)), &[l3]);
        assert_eq!(net.road_of(l2), Some(r0));
        assert_eq!(net.intersection_ahead(l3), Some(IntersectionId(1)));
    }

    #[test]
    fn unknown_lane_has_no_road() {
        let (net, ..) = approach();
        assert_eq!(net.road_of(td_core::LaneId(99)), None);
        assert_eq!(net.intersection_ahead(td_core::LaneId(99)), None);
    }

    #[test]
    fn lane_on_unknown_road_rejected() {
        let mut b = LaneNetworkBuilder::new();
        let err = b.add_lane(RoadId(0), 10.0, TurnSet::ALL).unwrap_err();
        assert!(matches!(err, LaneError::UnknownRoad(RoadId(0))));
    }

    #[test]
    fn non_positive_length_rejected() {
        let mut b = LaneNetworkBuilder::new();
        let r = b.add_road(IntersectionId(0));
        assert!(matches!(b.add_lane(r, 0.0, TurnSet::ALL), Err(LaneError::Config(_))));
    }

    #[test]
    fn lane_changing_flag() {
        let net = LaneNetworkBuilder::new().lane_changing(true).build();
        assert!(net.lane_changing_allowed());
        assert!(!LaneNetworkBuilder::new().build().lane_changing_allowed());
    }
}

// ── Eligibility & restrictions ────────────────────────────────────────────────

#[cfg(test)]
mod eligibility {
    use td_core::{IntersectionId, TurnDirection, TurnSet, VehicleClassId};

    use super::helpers::approach;
    use crate::{LaneError, LaneModel};

    const CAR: VehicleClassId = VehicleClassId(0);
    const BUS: VehicleClassId = VehicleClassId(1);

    #[test]
    fn eligible_lanes_follow_turn_permissions() {
        let (net, r0, [l0, l1, l2, _]) = approach();
        let i0 = IntersectionId(0);
        assert_eq!(net.eligible_lanes(i0, r0, CAR, TurnDirection::Left), vec![l0]);
        assert_eq!(net.eligible_lanes(i0, r0, CAR, TurnDirection::Straight), vec![l1, l2]);
        assert!(net.eligible_lanes(i0, r0, CAR, TurnDirection::UTurn).is_empty());
    }

    #[test]
    fn wrong_intersection_has_no_lanes() {
        let (net, r0, _) = approach();
        assert!(net.eligible_lanes(IntersectionId(1), r0, CAR, TurnDirection::Left).is_empty());
    }

    #[test]
    fn class_override_and_epoch() {
        let (mut net, r0, [_, l1, l2, _]) = approach();
        let i0 = IntersectionId(0);
        assert_eq!(net.restriction_epoch(), 0);

        net.restrict(l1, BUS, TurnSet::EMPTY).unwrap();
        assert_eq!(net.restriction_epoch(), 1);
        assert_eq!(net.eligible_lanes(i0, r0, BUS, TurnDirection::Straight), vec![l2]);
        // Other classes keep the lane default.
        assert_eq!(net.eligible_lanes(i0, r0, CAR, TurnDirection::Straight), vec![l1, l2]);

        net.clear_restriction(l1, BUS).unwrap();
        assert_eq!(net.restriction_epoch(), 2);
        assert_eq!(net.eligible_lanes(i0, r0, BUS, TurnDirection::Straight), vec![l1, l2]);

        // Clearing a missing override is not a change.
        net.clear_restriction(l1, BUS).unwrap();
        assert_eq!(net.restriction_epoch(), 2);
    }

    #[test]
    fn set_lane_turns_bumps_epoch() {
        let (mut net, r0, [l0, ..]) = approach();
        net.set_lane_turns(l0, TurnSet::of(&[TurnDirection::Left, TurnDirection::UTurn])).unwrap();
        assert_eq!(net.restriction_epoch(), 1);
        assert_eq!(
            net.eligible_lanes(IntersectionId(0), r0, CAR, TurnDirection::UTurn),
            vec![l0]
        );
    }

    #[test]
    fn restricting_unknown_lane_fails() {
        let (mut net, ..) = approach();
        let err = net.restrict(td_core::LaneId(42), CAR, TurnSet::ALL).unwrap_err();
        assert!(matches!(err, LaneError::UnknownLane(_)));
        assert_eq!(net.restriction_epoch(), 0);
    }
}

// ── Congestion ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod congestion {
    use super::helpers::approach;
    use crate::{LaneError, LaneModel};

    #[test]
    fn counts_vehicles_ahead_of_position() {
        let (mut net, _, [l0, l1, ..]) = approach();
        net.place_vehicle(l0, 10.0).unwrap();
        net.place_vehicle(l0, 60.0).unwrap();
        net.place_vehicle(l0, 95.0).unwrap();
        assert_eq!(net.congestion_count(l0, 0.0), 3);
        assert_eq!(net.congestion_count(l0, 50.0), 2);
        assert_eq!(net.congestion_count(l1, 0.0), 0);
        // Vehicles never affect restrictions.
        assert_eq!(net.restriction_epoch(), 0);

        net.clear_vehicles();
        assert_eq!(net.congestion_count(l0, 0.0), 0);
    }

    #[test]
    fn position_outside_lane_rejected() {
        let (mut net, _, [l0, ..]) = approach();
        assert!(matches!(net.place_vehicle(l0, 150.0), Err(LaneError::Config(_))));
        assert_eq!(net.congestion_count(td_core::LaneId(77), 0.0), 0);
    }
}

// ── Destination selection ─────────────────────────────────────────────────────

#[cfg(test)]
mod destination {
    use td_core::{RoadId, SimRng, TurnDirection};

    use crate::{DestinationSelector, TurnTable};

    #[test]
    fn single_exit_is_deterministic() {
        let mut table = TurnTable::new();
        table.connect(RoadId(0), TurnDirection::Left, RoadId(5));
        let mut rng = SimRng::new(1);
        assert_eq!(table.select_destination(RoadId(0), TurnDirection::Left, &mut rng), Some(RoadId(5)));
        assert_eq!(table.select_destination(RoadId(0), TurnDirection::Right, &mut rng), None);
    }

    #[test]
    fn several_exits_choose_among_them() {
        let mut table = TurnTable::new();
        table.connect(RoadId(0), TurnDirection::Straight, RoadId(1));
        table.connect(RoadId(0), TurnDirection::Straight, RoadId(2));
        table.connect(RoadId(0), TurnDirection::Straight, RoadId(2));
        assert_eq!(table.exits(RoadId(0), TurnDirection::Straight), &[RoadId(1), RoadId(2)]);

        let mut rng = SimRng::new(3);
        for _ in 0..20 {
            let dest = table.select_destination(RoadId(0), TurnDirection::Straight, &mut rng);
            assert!(matches!(dest, Some(RoadId(1)) | Some(RoadId(2))));
        }
    }
}
