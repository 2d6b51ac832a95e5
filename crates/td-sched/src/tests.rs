//! Unit, scenario, and property tests for td-sched.

use td_core::{
    IntersectionId, LaneId, RoadId, SimRng, TickMode, TurnAction, TurnDirection, TurnSet,
    TurnWeights, VehicleCatalog, VehicleClassId, VehicleSpec,
};
use td_demand::{DemandTable, TimeBucket};
use td_lanes::{LaneNetwork, LaneNetworkBuilder, TurnTable};

use crate::SchedulerBuilder;

// ── Helpers ───────────────────────────────────────────────────────────────────

const LEFT: TurnAction = TurnAction::Turn(TurnDirection::Left);
const STRAIGHT: TurnAction = TurnAction::Turn(TurnDirection::Straight);
const RIGHT: TurnAction = TurnAction::Turn(TurnDirection::Right);

const CAR: VehicleClassId = VehicleClassId(0);
const BUS: VehicleClassId = VehicleClassId(1);

fn spec(name: &str, class: VehicleClassId) -> VehicleSpec {
    VehicleSpec { name: name.into(), class, length_m: 4.5, max_speed_mps: 14.0 }
}

fn car_catalog() -> VehicleCatalog {
    VehicleCatalog::new(vec![spec("car", CAR)]).unwrap()
}

fn bucket(start: f64, dur: f64, counts: &[(TurnAction, u32)]) -> TimeBucket {
    TimeBucket::with_counts(start, dur, counts).unwrap()
}

/// Demand on road 0 only.
fn one_road(buckets: Vec<TimeBucket>) -> DemandTable {
    DemandTable::build([(RoadId(0), buckets)]).unwrap()
}

/// Road 0 into intersection 0 with a single any-turn lane.
fn single_lane() -> (LaneNetwork, LaneId) {
    let mut b = LaneNetworkBuilder::new();
    let road = b.add_road(IntersectionId(0));
    let lane = b.add_lane(road, 100.0, TurnSet::ALL).unwrap();
    (b.build(), lane)
}

/// Road 0 into intersection 0:
///
/// ```text
///   lane 0: left only
///   lane 1: straight
///   lane 2: straight + right
/// ```
fn approach() -> (LaneNetwork, [LaneId; 3]) {
    use TurnDirection::*;
    let mut b = LaneNetworkBuilder::new();
    let road = b.add_road(IntersectionId(0));
    let l0 = b.add_lane(road, 100.0, TurnSet::of(&[Left])).unwrap();
    let l1 = b.add_lane(road, 100.0, TurnSet::of(&[Straight])).unwrap();
    let l2 = b.add_lane(road, 100.0, TurnSet::of(&[Straight, Right])).unwrap();
    (b.build(), [l0, l1, l2])
}

// ── DemandWindow ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod window {
    use super::*;
    use crate::DemandWindow;

    #[test]
    fn no_event_fabricated_or_lost() {
        let table = one_road(vec![bucket(0.0, 60.0, &[(LEFT, 2), (RIGHT, 1)])]);
        for seed in 0..20 {
            let mut rng = SimRng::new(seed);
            let mut window = DemandWindow::new(&table, TurnWeights::UNIFORM);
            window.advance_to(0, &mut rng).unwrap();

            let queue = window.queue(RoadId(0)).unwrap();
            let mut dirs: Vec<TurnDirection> = queue.iter().map(|e| e.direction).collect();
            dirs.sort();
            assert_eq!(dirs, vec![TurnDirection::Left, TurnDirection::Left, TurnDirection::Right]);

            let times: Vec<f64> = queue.iter().map(|e| e.spawn_secs).collect();
            assert!(times.windows(2).all(|w| w[0] <= w[1]));
            assert!(times.iter().all(|&t| (0.0..60.0).contains(&t)));
            assert_eq!(window.scheduled(), 3);
        }
    }

    #[test]
    fn carried_events_keep_time_and_direction() {
        let table = one_road(vec![
            bucket(0.0, 60.0, &[(STRAIGHT, 3)]),
            bucket(60.0, 60.0, &[(LEFT, 2)]),
        ]);
        let mut rng = SimRng::new(5);
        let mut window = DemandWindow::new(&table, TurnWeights::UNIFORM);
        window.advance_to(0, &mut rng).unwrap();

        // Dispatch 2 of 3.
        for _ in 0..2 {
            window.queue_mut(RoadId(0)).unwrap().pop_front().unwrap();
            window.record_dispatch();
        }
        let carried = *window.queue(RoadId(0)).unwrap().front().unwrap();

        window.advance_to(1, &mut rng).unwrap();
        let queue = window.queue(RoadId(0)).unwrap();
        assert_eq!(queue.len(), 1 + 2);
        let head = queue.front().unwrap();
        assert_eq!(head.spawn_secs, carried.spawn_secs);
        assert_eq!(head.direction, carried.direction);
        assert_eq!(head.seq, carried.seq);
        assert!(queue.iter().skip(1).all(|e| e.direction == TurnDirection::Left && e.spawn_secs >= 60.0));

        assert_eq!(window.scheduled(), 5);
        assert_eq!(window.dispatched(), 2);
        assert_eq!(window.pending(), 3);
        window.check_conservation().unwrap();
    }

    #[test]
    fn two_carried_events_keep_order_time_and_direction() {
        let table = one_road(vec![
            bucket(0.0, 60.0, &[(LEFT, 2), (RIGHT, 1)]),
            bucket(60.0, 60.0, &[(STRAIGHT, 1)]),
        ]);
        let mut rng = SimRng::new(11);
        let mut window = DemandWindow::new(&table, TurnWeights::UNIFORM);
        window.advance_to(0, &mut rng).unwrap();

        // Dispatch 1 of 3.
        window.queue_mut(RoadId(0)).unwrap().pop_front().unwrap();
        window.record_dispatch();
        let carried: Vec<_> = window.queue(RoadId(0)).unwrap().iter().copied().collect();
        assert_eq!(carried.len(), 2);

        window.advance_to(1, &mut rng).unwrap();
        let queue: Vec<_> = window.queue(RoadId(0)).unwrap().iter().copied().collect();
        assert_eq!(queue.len(), 2 + 1);
        for (kept, before) in queue.iter().zip(&carried) {
            assert_eq!(kept.spawn_secs, before.spawn_secs);
            assert_eq!(kept.direction, before.direction);
            assert_eq!(kept.seq, before.seq);
        }
        assert_eq!(queue[2].direction, TurnDirection::Straight);
        assert!(queue[2].spawn_secs >= 60.0);

        assert_eq!(window.scheduled(), 4);
        assert_eq!(window.dispatched(), 1);
        assert_eq!(window.pending(), 3);
        window.check_conservation().unwrap();
    }

    #[test]
    fn ensure_expands_every_started_bucket() {
        let table = one_road(vec![
            bucket(0.0, 10.0, &[(LEFT, 1)]),
            bucket(10.0, 10.0, &[(LEFT, 2)]),
            bucket(20.0, 10.0, &[(LEFT, 3)]),
        ]);
        let mut rng = SimRng::new(1);
        let mut window = DemandWindow::new(&table, TurnWeights::UNIFORM);

        window.ensure(15.0, &mut rng).unwrap();
        assert_eq!(window.watermark(), Some(1));
        assert_eq!(window.scheduled(), table.total_scheduled_through(15.0));

        // A jump past the end still expands the skipped bucket.
        window.ensure(35.0, &mut rng).unwrap();
        assert_eq!(window.watermark(), Some(2));
        assert_eq!(window.scheduled(), table.total());

        // Nothing left to expand.
        window.ensure(50.0, &mut rng).unwrap();
        assert_eq!(window.scheduled(), 6);
    }

    #[test]
    fn ensure_before_first_bucket_does_nothing() {
        let table = one_road(vec![bucket(30.0, 10.0, &[(LEFT, 1)])]);
        let mut rng = SimRng::new(1);
        let mut window = DemandWindow::new(&table, TurnWeights::UNIFORM);
        window.ensure(10.0, &mut rng).unwrap();
        assert_eq!(window.watermark(), None);
        assert_eq!(window.pending(), 0);
    }

    #[test]
    fn locate_is_bounded_by_watermark() {
        let table = one_road(vec![
            bucket(0.0, 10.0, &[]),
            bucket(10.0, 10.0, &[]),
            bucket(20.0, 10.0, &[]),
        ]);
        let mut rng = SimRng::new(1);
        let mut window = DemandWindow::new(&table, TurnWeights::UNIFORM);
        assert_eq!(window.locate_bucket_index(5.0), Some(0));
        window.advance_to(1, &mut rng).unwrap();
        assert_eq!(window.locate_bucket_index(5.0), None);
        assert_eq!(window.locate_bucket_index(15.0), Some(1));
        assert_eq!(window.locate_bucket_index(25.0), Some(2));
        assert_eq!(window.locate_bucket_index(-1.0), None);
    }

    #[test]
    fn empty_bucket_leaves_empty_queue() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(LEFT, 0)])]);
        let mut rng = SimRng::new(1);
        let mut window = DemandWindow::new(&table, TurnWeights::UNIFORM);
        window.advance_to(0, &mut rng).unwrap();
        assert_eq!(window.watermark(), Some(0));
        assert!(window.queue(RoadId(0)).unwrap().is_empty());
        assert!(window.queue(RoadId(7)).is_none());
    }

    #[test]
    fn compound_actions_resolve_within_options() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(TurnAction::StraightOrLeft, 20)])]);
        let mut rng = SimRng::new(9);
        let mut window = DemandWindow::new(&table, TurnWeights::UNIFORM);
        window.advance_to(0, &mut rng).unwrap();
        assert!(window
            .queue(RoadId(0))
            .unwrap()
            .iter()
            .all(|e| matches!(e.direction, TurnDirection::Straight | TurnDirection::Left)));
    }

    #[test]
    fn advance_is_idempotent_below_watermark() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(LEFT, 4)])]);
        let mut rng = SimRng::new(1);
        let mut window = DemandWindow::new(&table, TurnWeights::UNIFORM);
        window.advance_to(0, &mut rng).unwrap();
        window.advance_to(0, &mut rng).unwrap();
        window.advance_to(9, &mut rng).unwrap();
        assert_eq!(window.scheduled(), 4);
        assert_eq!(window.pending(), 4);
    }
}

// ── DemandScheduler ───────────────────────────────────────────────────────────

#[cfg(test)]
mod plain {
    use super::*;
    use crate::SchedError;

    #[test]
    fn single_event_dispatched_once_in_its_tick() {
        let table = one_road(vec![bucket(0.0, 60.0, &[(STRAIGHT, 1)])]);
        let (lanes, lane) = single_lane();

        for seed in 0..50 {
            let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
                .seed(seed)
                .build()
                .unwrap();
            let mut dispatches = Vec::new();
            for _ in 0..6 {
                let requests = sched.act(&lanes, lane, 10.0).unwrap();
                let clock = sched.clock().now_secs;
                for r in requests {
                    dispatches.push((clock, r.spawn_secs));
                }
            }
            assert_eq!(dispatches.len(), 1, "seed {seed}");
            let (clock, t) = dispatches[0];
            assert!(clock - 10.0 <= t && t <= clock, "seed {seed}: t={t} clock={clock}");
            assert_eq!(sched.total_dispatched(), 1);
            assert_eq!(sched.pending_in_current_window(), 0);
        }
    }

    #[test]
    fn first_tick_ends_one_tick_after_epoch() {
        let table = one_road(vec![bucket(0.0, 60.0, &[])]);
        let (lanes, lane) = single_lane();
        let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .build()
            .unwrap();
        sched.act(&lanes, lane, 10.0).unwrap();
        assert_eq!(sched.clock().now_secs, 10.0);
        sched.act(&lanes, lane, 10.0).unwrap();
        assert_eq!(sched.clock().now_secs, 20.0);
        assert_eq!(sched.clock().current_tick, td_core::Tick(1));

        // A change of tick size starts a tick too.
        sched.act(&lanes, lane, 5.0).unwrap();
        assert_eq!(sched.clock().now_secs, 25.0);
        assert_eq!(sched.clock().tick_secs, 5.0);
    }

    #[test]
    fn one_request_per_spec_with_destination() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 1)])]);
        let (lanes, lane) = single_lane();
        let catalog = VehicleCatalog::new(vec![
            spec("car", CAR),
            spec("van", CAR),
            spec("bus", BUS),
        ])
        .unwrap();
        let mut turns = TurnTable::new();
        turns.connect(RoadId(0), TurnDirection::Straight, RoadId(9));

        let mut sched = SchedulerBuilder::new(&table, catalog, turns).seed(3).build().unwrap();
        let requests = sched.act(&lanes, lane, 10.0).unwrap();

        assert_eq!(requests.len(), 3);
        let mut vehicles: Vec<u16> = requests.iter().map(|r| r.vehicle.0).collect();
        vehicles.sort();
        assert_eq!(vehicles, vec![0, 1, 2]);
        for r in &requests {
            assert_eq!(r.direction, TurnDirection::Straight);
            assert_eq!(r.destination, Some(RoadId(9)));
            assert_eq!(r.lane, lane);
            assert_eq!(r.road, RoadId(0));
            assert_eq!(r.spawn_secs, requests[0].spawn_secs);
        }
        let bus = requests.iter().find(|r| r.vehicle.0 == 2).unwrap();
        assert_eq!(bus.class, BUS);
        // One event, however many specs.
        assert_eq!(sched.total_dispatched(), 1);
    }

    #[test]
    fn unknown_lane_is_an_error() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 1)])]);
        let (lanes, _) = single_lane();
        let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .build()
            .unwrap();
        let err = sched.act(&lanes, LaneId(40), 10.0).unwrap_err();
        assert!(matches!(err, SchedError::UnknownLane(LaneId(40))));
    }

    #[test]
    fn road_without_demand_is_empty() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 1)])]);
        let mut b = LaneNetworkBuilder::new();
        let r0 = b.add_road(IntersectionId(0));
        let r1 = b.add_road(IntersectionId(0));
        b.add_lane(r0, 50.0, TurnSet::ALL).unwrap();
        let quiet = b.add_lane(r1, 50.0, TurnSet::ALL).unwrap();
        let lanes = b.build();

        let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .build()
            .unwrap();
        assert!(sched.act(&lanes, quiet, 10.0).unwrap().is_empty());
        // The window still advanced for the roads that do have demand.
        assert_eq!(sched.total_scheduled(), 1);
    }

    #[test]
    fn bad_tick_size_rejected() {
        let table = one_road(vec![bucket(0.0, 10.0, &[])]);
        let (lanes, lane) = single_lane();
        let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .build()
            .unwrap();
        assert!(matches!(sched.act(&lanes, lane, 0.0), Err(SchedError::Config(_))));
        assert!(matches!(sched.act(&lanes, lane, f64::NAN), Err(SchedError::Config(_))));
        assert!(!sched.clock().started());
    }

    #[test]
    fn large_tick_skips_buckets_without_losing_vehicles() {
        let table = one_road(vec![
            bucket(0.0, 10.0, &[(LEFT, 1)]),
            bucket(10.0, 10.0, &[(LEFT, 2)]),
            bucket(20.0, 10.0, &[(LEFT, 3)]),
        ]);
        let (lanes, lane) = single_lane();
        let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .build()
            .unwrap();

        let requests = sched.act(&lanes, lane, 100.0).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(sched.total_scheduled(), 6);

        let mut dispatched = 1;
        for _ in 0..10 {
            dispatched += sched.act(&lanes, lane, 100.0).unwrap().len();
        }
        assert_eq!(dispatched, 6);
        assert_eq!(sched.pending_in_current_window(), 0);
    }

    #[test]
    fn same_seed_same_requests() {
        let table = one_road(vec![bucket(0.0, 60.0, &[(LEFT, 3), (STRAIGHT, 4), (TurnAction::Any, 2)])]);
        let (lanes, lane) = single_lane();
        let run = |seed| {
            let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
                .seed(seed)
                .build()
                .unwrap();
            let mut out = Vec::new();
            for _ in 0..20 {
                out.extend(sched.act(&lanes, lane, 7.5).unwrap());
            }
            out
        };
        assert_eq!(run(42), run(42));
        assert_eq!(run(42).len(), 9);
    }

    #[test]
    fn explicit_mode_revisits_stay_in_tick() {
        let table = one_road(vec![bucket(0.0, 60.0, &[(STRAIGHT, 3)])]);
        let (lanes, lane) = single_lane();
        let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .tick_mode(TickMode::Explicit)
            .build()
            .unwrap();

        // First call auto-starts the first tick.
        sched.act(&lanes, lane, 10.0).unwrap();
        sched.act(&lanes, lane, 10.0).unwrap();
        assert_eq!(sched.clock().now_secs, 10.0);

        sched.begin_tick(10.0).unwrap();
        sched.act(&lanes, lane, 10.0).unwrap();
        assert_eq!(sched.clock().now_secs, 20.0);
        assert_eq!(sched.clock().current_tick, td_core::Tick(1));
    }

    #[test]
    fn diagnostics_balance_after_every_call() {
        let table = one_road(vec![
            bucket(0.0, 30.0, &[(LEFT, 5), (RIGHT, 2)]),
            bucket(30.0, 30.0, &[(STRAIGHT, 4)]),
        ]);
        let (lanes, lane) = single_lane();
        let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .seed(8)
            .build()
            .unwrap();
        for step in 0..40 {
            sched.act(&lanes, lane, 3.0).unwrap();
            assert_eq!(
                sched.total_scheduled() - sched.total_dispatched(),
                sched.pending_in_current_window(),
                "step {step}"
            );
        }
        assert_eq!(sched.total_dispatched(), 11);
    }

    #[test]
    fn unknown_spec_surfaces_as_error() {
        use td_core::{TdError, VehicleSpecId};
        use td_demand::ScheduledEvent;

        use crate::scheduler::build_requests;

        let event = ScheduledEvent {
            spawn_secs: 3.0,
            direction:  TurnDirection::Left,
            seq:        0,
        };
        let mut rng = SimRng::new(1);
        let result = build_requests(
            &event,
            LaneId(0),
            RoadId(0),
            vec![VehicleSpecId(0), VehicleSpecId(9)],
            &car_catalog(),
            &TurnTable::new(),
            &mut rng,
        );
        assert!(matches!(
            result,
            Err(SchedError::Core(TdError::VehicleSpecNotFound(VehicleSpecId(9))))
        ));
    }

    #[test]
    fn tracker_remembers_previous_tick() {
        use crate::TickTracker;

        let mut ticks = TickTracker::new(TickMode::Implicit);
        assert!(ticks.visit(LaneId(0), 10.0).unwrap());
        assert!(!ticks.visit(LaneId(1), 10.0).unwrap());
        assert!(!ticks.serviced_last_tick(LaneId(0)));

        // Revisit of lane 0 rolls the tick over.
        assert!(ticks.visit(LaneId(0), 10.0).unwrap());
        assert!(ticks.serviced(LaneId(0)));
        assert!(!ticks.serviced(LaneId(1)));
        assert!(ticks.serviced_last_tick(LaneId(0)));
        assert!(ticks.serviced_last_tick(LaneId(1)));

        ticks.begin_tick(10.0).unwrap();
        assert!(ticks.serviced_last_tick(LaneId(0)));
        assert!(!ticks.serviced_last_tick(LaneId(1)));
    }
}

// ── RestrictedDemandScheduler ─────────────────────────────────────────────────

#[cfg(test)]
mod restricted {
    use super::*;
    use crate::{LanePolicy, RestrictedDemandScheduler, SchedError};

    fn explicit<'a>(table: &'a DemandTable, lanes: &LaneNetwork) -> RestrictedDemandScheduler<'a, TurnTable> {
        SchedulerBuilder::new(table, car_catalog(), TurnTable::new())
            .seed(4)
            .tick_mode(TickMode::Explicit)
            .build_restricted(lanes)
            .unwrap()
    }

    #[test]
    fn lane_changing_fails_precondition() {
        let table = one_road(vec![bucket(0.0, 10.0, &[])]);
        let lanes = LaneNetworkBuilder::new().lane_changing(true).build();
        let result = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .build_restricted(&lanes);
        assert!(matches!(result, Err(SchedError::Precondition(_))));
    }

    #[test]
    fn unknown_class_rejected_before_any_work() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 1)])]);
        let (lanes, [_, l1, _]) = approach();
        let mut sched = explicit(&table, &lanes);
        let err = sched.act(&lanes, l1, 10.0, BUS).unwrap_err();
        assert!(matches!(err, SchedError::UnknownVehicleClass(BUS)));
        assert_eq!(sched.total_scheduled(), 0);
        assert!(!sched.clock().started());
    }

    #[test]
    fn lanes_claim_only_eligible_events() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(LEFT, 1), (STRAIGHT, 1)])]);
        let (lanes, [l0, l1, l2]) = approach();
        let mut sched = explicit(&table, &lanes);
        sched.begin_tick(10.0).unwrap();

        let straight = sched.act(&lanes, l1, 10.0, CAR).unwrap();
        assert_eq!(straight.len(), 1);
        assert_eq!(straight[0].direction, TurnDirection::Straight);
        assert_eq!(straight[0].lane, l1);

        // The left event was queued ahead of the straight one, so l1 skipped it.
        let head = *sched.window().queue(RoadId(0)).unwrap().front().unwrap();
        assert_eq!(head.direction, TurnDirection::Left);
        assert!(head.spawn_secs < straight[0].spawn_secs);

        let left = sched.act(&lanes, l0, 10.0, CAR).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].direction, TurnDirection::Left);

        assert!(sched.act(&lanes, l2, 10.0, CAR).unwrap().is_empty());
        assert_eq!(sched.total_dispatched(), 2);
    }

    #[test]
    fn lane_used_at_most_once_per_tick() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 3)])]);
        let (lanes, [_, l1, l2]) = approach();
        let mut sched = explicit(&table, &lanes);
        sched.begin_tick(10.0).unwrap();

        assert_eq!(sched.act(&lanes, l1, 10.0, CAR).unwrap().len(), 1);
        assert!(sched.lane_used(l1));
        assert!(sched.act(&lanes, l1, 10.0, CAR).unwrap().is_empty());
        assert_eq!(sched.act(&lanes, l2, 10.0, CAR).unwrap().len(), 1);
        assert_eq!(sched.pending_in_current_window(), 1);

        sched.begin_tick(10.0).unwrap();
        assert!(!sched.lane_used(l1));
        assert_eq!(sched.act(&lanes, l1, 10.0, CAR).unwrap().len(), 1);
    }

    #[test]
    fn implicit_revisit_starts_new_tick() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 2)])]);
        let (lanes, [_, l1, _]) = approach();
        let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .build_restricted(&lanes)
            .unwrap();

        assert_eq!(sched.act(&lanes, l1, 10.0, CAR).unwrap().len(), 1);
        assert_eq!(sched.clock().now_secs, 10.0);
        // Revisit → new tick → used set cleared.
        assert_eq!(sched.act(&lanes, l1, 10.0, CAR).unwrap().len(), 1);
        assert_eq!(sched.clock().now_secs, 20.0);
    }

    #[test]
    fn late_dispatch_recorded_once() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(LEFT, 1)])]);
        let (lanes, [l0, ..]) = approach();
        let mut sched = explicit(&table, &lanes);
        for _ in 0..3 {
            sched.begin_tick(10.0).unwrap();
        }
        assert_eq!(sched.clock().now_secs, 30.0);

        let requests = sched.act(&lanes, l0, 10.0, CAR).unwrap();
        assert_eq!(requests.len(), 1);
        let t = requests[0].spawn_secs;

        let log = sched.lateness();
        assert_eq!(log.count(), 1);
        let record = log.records()[0];
        assert_eq!(record.direction, TurnDirection::Left);
        assert_eq!(record.spawn_secs, t);
        assert_eq!(record.dispatch_secs, 30.0);
        assert_eq!(record.delay_secs, 30.0 - t);
        assert_eq!(record.lane, l0);
    }

    #[test]
    fn on_time_dispatch_not_late() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(LEFT, 1)])]);
        let (lanes, [l0, ..]) = approach();
        let mut sched = explicit(&table, &lanes);
        sched.begin_tick(10.0).unwrap();
        assert_eq!(sched.act(&lanes, l0, 10.0, CAR).unwrap().len(), 1);
        assert!(sched.lateness().is_empty());
    }

    #[test]
    fn cache_follows_restriction_epoch() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 4)])]);
        let (mut lanes, [_, l1, l2]) = approach();
        let mut sched = explicit(&table, &lanes);

        sched.begin_tick(10.0).unwrap();
        assert_eq!(sched.act(&lanes, l1, 10.0, CAR).unwrap().len(), 1);
        assert_eq!(sched.cache().misses(), 1);
        assert_eq!(sched.act(&lanes, l2, 10.0, CAR).unwrap().len(), 1);
        assert_eq!(sched.cache().misses(), 1);

        lanes.restrict(l1, CAR, TurnSet::EMPTY).unwrap();
        sched.begin_tick(10.0).unwrap();
        assert!(sched.act(&lanes, l1, 10.0, CAR).unwrap().is_empty());
        assert_eq!(sched.cache().misses(), 2);
        assert_eq!(sched.act(&lanes, l2, 10.0, CAR).unwrap().len(), 1);
    }

    /// Road 0: an empty first bucket, then `straight` events in `[10, 20)`.
    fn straight_after_first_tick(straight: u32) -> DemandTable {
        one_road(vec![bucket(0.0, 10.0, &[]), bucket(10.0, 10.0, &[(STRAIGHT, straight)])])
    }

    fn least_congested<'a>(
        table:   &'a DemandTable,
        catalog: VehicleCatalog,
        lanes:   &LaneNetwork,
        mode:    TickMode,
    ) -> RestrictedDemandScheduler<'a, TurnTable> {
        SchedulerBuilder::new(table, catalog, TurnTable::new())
            .tick_mode(mode)
            .lane_policy(LanePolicy::LeastCongested)
            .build_restricted(lanes)
            .unwrap()
    }

    #[test]
    fn least_congested_defers_to_emptier_lane() {
        let table = straight_after_first_tick(2);
        let (mut lanes, [_, l1, l2]) = approach();
        for pos in [10.0, 40.0, 70.0] {
            lanes.place_vehicle(l1, pos).unwrap();
        }
        let mut sched = least_congested(&table, car_catalog(), &lanes, TickMode::Explicit);

        // Nothing is due in the first tick; both spawn points are serviced.
        sched.begin_tick(10.0).unwrap();
        assert!(sched.act(&lanes, l1, 10.0, CAR).unwrap().is_empty());
        assert!(sched.act(&lanes, l2, 10.0, CAR).unwrap().is_empty());

        // l2 is emptier and not yet visited this tick.
        sched.begin_tick(10.0).unwrap();
        assert!(sched.act(&lanes, l1, 10.0, CAR).unwrap().is_empty());
        assert_eq!(sched.act(&lanes, l2, 10.0, CAR).unwrap().len(), 1);
        // l2 is used now, so l1 is the least congested free lane.
        assert_eq!(sched.act(&lanes, l1, 10.0, CAR).unwrap().len(), 1);
        assert!(sched.lateness().is_empty());
    }

    #[test]
    fn least_congested_ignores_lane_never_visited() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 1)])]);
        let (mut lanes, [_, l1, _]) = approach();
        lanes.place_vehicle(l1, 50.0).unwrap();
        let mut sched = least_congested(&table, car_catalog(), &lanes, TickMode::Implicit);

        // Only l1 is ever serviced; the emptier l2 must not hold the event.
        let mut dispatched = 0;
        for _ in 0..100 {
            dispatched += sched.act(&lanes, l1, 10.0, CAR).unwrap().len();
        }
        assert_eq!(dispatched, 1);
        assert_eq!(sched.total_dispatched(), 1);
        assert_eq!(sched.pending_in_current_window(), 0);
    }

    #[test]
    fn least_congested_claims_late_event_despite_emptier_lane() {
        let table = straight_after_first_tick(1);
        let (mut lanes, [_, l1, l2]) = approach();
        lanes.place_vehicle(l1, 50.0).unwrap();
        // Buses may not go straight from l2, so l2 never claims the event.
        lanes.restrict(l2, BUS, TurnSet::of(&[TurnDirection::Left])).unwrap();
        let catalog = VehicleCatalog::new(vec![spec("car", CAR), spec("bus", BUS)]).unwrap();
        let mut sched = least_congested(&table, catalog, &lanes, TickMode::Explicit);

        sched.begin_tick(10.0).unwrap();
        assert!(sched.act(&lanes, l1, 10.0, CAR).unwrap().is_empty());
        assert!(sched.act(&lanes, l2, 10.0, BUS).unwrap().is_empty());

        // Due but not late: l1 gives way to l2, which cannot take it.
        sched.begin_tick(10.0).unwrap();
        assert!(sched.act(&lanes, l1, 10.0, CAR).unwrap().is_empty());
        assert!(sched.act(&lanes, l2, 10.0, BUS).unwrap().is_empty());
        assert_eq!(sched.pending_in_current_window(), 1);

        // Late now: l1 takes it.
        sched.begin_tick(10.0).unwrap();
        let requests = sched.act(&lanes, l1, 10.0, CAR).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].lane, l1);
        assert_eq!(sched.lateness().count(), 1);
        assert_eq!(sched.pending_in_current_window(), 0);
    }

    #[test]
    fn any_eligible_ignores_congestion() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 1)])]);
        let (mut lanes, [_, l1, _]) = approach();
        lanes.place_vehicle(l1, 10.0).unwrap();
        let mut sched = explicit(&table, &lanes);
        sched.begin_tick(10.0).unwrap();
        assert_eq!(sched.act(&lanes, l1, 10.0, CAR).unwrap().len(), 1);
    }

    #[test]
    fn requests_only_for_requested_class() {
        let table = one_road(vec![bucket(0.0, 10.0, &[(STRAIGHT, 1)])]);
        let (lanes, [_, l1, _]) = approach();
        let catalog = VehicleCatalog::new(vec![
            spec("car", CAR),
            spec("bus", BUS),
            spec("van", CAR),
        ])
        .unwrap();
        let mut sched = SchedulerBuilder::new(&table, catalog, TurnTable::new())
            .build_restricted(&lanes)
            .unwrap();
        let requests = sched.act(&lanes, l1, 10.0, CAR).unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.class == CAR));
    }
}

// ── SpawnLoop ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod driver {
    use td_core::{RunConfig, Tick};

    use super::*;
    use crate::{
        LatenessRecord, NoopObserver, RunSummary, SchedulerObserver, SpawnLoop, SpawnPoint,
        SpawnRequest, TickStats,
    };

    fn config(total_ticks: u64, tick_mode: TickMode) -> RunConfig {
        RunConfig {
            tick_secs:             10.0,
            total_ticks,
            seed:                  42,
            tick_mode,
            output_interval_ticks: 4,
        }
    }

    #[derive(Default)]
    struct Recorder {
        starts:    u64,
        spawns:    Vec<(Tick, SpawnRequest)>,
        late:      u64,
        ends:      Vec<TickStats>,
        summaries: u64,
        finished:  Option<RunSummary>,
    }

    impl SchedulerObserver for Recorder {
        fn on_tick_start(&mut self, _tick: Tick) {
            self.starts += 1;
        }
        fn on_spawn(&mut self, tick: Tick, request: &SpawnRequest) {
            self.spawns.push((tick, *request));
        }
        fn on_late(&mut self, _tick: Tick, _record: &LatenessRecord) {
            self.late += 1;
        }
        fn on_tick_end(&mut self, stats: &TickStats) {
            self.ends.push(*stats);
        }
        fn on_summary(&mut self, _stats: &TickStats) {
            self.summaries += 1;
        }
        fn on_run_end(&mut self, summary: &RunSummary) {
            self.finished = Some(*summary);
        }
    }

    fn demand() -> DemandTable {
        one_road(vec![bucket(0.0, 60.0, &[(STRAIGHT, 4), (LEFT, 2)])])
    }

    fn points(lanes: [LaneId; 3]) -> Vec<SpawnPoint> {
        lanes.iter().map(|&l| SpawnPoint::new(l, CAR)).collect()
    }

    #[test]
    fn restricted_run_dispatches_everything() {
        for mode in [TickMode::Implicit, TickMode::Explicit] {
            let table = demand();
            let (lanes, ids) = approach();
            let cfg = config(8, mode);
            let sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
                .config(&cfg)
                .build_restricted(&lanes)
                .unwrap();
            let mut driver = SpawnLoop::new(cfg, sched, points(ids)).unwrap();
            let mut rec = Recorder::default();
            let summary = driver.run(&lanes, &mut rec).unwrap();

            assert_eq!(rec.starts, 8);
            assert_eq!(rec.ends.len(), 8);
            assert_eq!(rec.summaries, 2);
            assert_eq!(summary.ticks, 8);
            assert_eq!(summary.dispatched, 6);
            assert_eq!(summary.pending, 0);
            assert_eq!(summary.requests, 6);
            assert_eq!(summary.late, rec.late);
            assert_eq!(rec.finished, Some(summary));

            // Clock is the end of each tick.
            for (i, stats) in rec.ends.iter().enumerate() {
                assert_eq!(stats.tick, Tick(i as u64));
                assert_eq!(stats.now_secs, 10.0 * (i + 1) as f64);
                assert_eq!(stats.scheduled - stats.dispatched, stats.pending);
            }
            // No spawn before its time.
            for (tick, r) in &rec.spawns {
                assert!(r.spawn_secs <= 10.0 * (tick.0 + 1) as f64);
            }
        }
    }

    #[test]
    fn plain_run_with_noop_observer() {
        let table = demand();
        let (lanes, lane) = single_lane();
        let cfg = config(10, TickMode::Implicit);
        let sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .config(&cfg)
            .build()
            .unwrap();
        let mut driver = SpawnLoop::new(cfg, sched, vec![SpawnPoint::new(lane, CAR)]).unwrap();
        let summary = driver.run(&lanes, &mut NoopObserver).unwrap();
        assert_eq!(summary.scheduled, 6);
        assert_eq!(summary.late, 0);
        assert_eq!(summary.dispatched + summary.pending, 6);
    }

    #[test]
    fn run_ticks_steps_incrementally() {
        let table = demand();
        let (lanes, ids) = approach();
        let cfg = config(100, TickMode::Implicit);
        let sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .build_restricted(&lanes)
            .unwrap();
        let mut driver = SpawnLoop::new(cfg, sched, points(ids)).unwrap();
        driver.run_ticks(3, &lanes, &mut NoopObserver).unwrap();
        assert_eq!(driver.ticks_run(), 3);
        assert_eq!(driver.scheduler.clock().now_secs, 30.0);
    }

    #[test]
    fn invalid_config_rejected() {
        let table = demand();
        let (lanes, ids) = approach();
        let mut cfg = config(5, TickMode::Implicit);
        cfg.tick_secs = -1.0;
        let sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
            .build_restricted(&lanes)
            .unwrap();
        assert!(SpawnLoop::new(cfg, sched, points(ids)).is_err());
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    /// Two roads, five 20 s buckets, one lane each.
    fn fixture(counts: &[(u32, u32)]) -> (DemandTable, LaneNetwork, [LaneId; 2]) {
        let road = |pick: fn(&(u32, u32)) -> u32, action| -> Vec<TimeBucket> {
            counts
                .iter()
                .enumerate()
                .map(|(i, c)| bucket(i as f64 * 20.0, 20.0, &[(action, pick(c))]))
                .collect()
        };
        let table = DemandTable::build([
            (RoadId(0), road(|c| c.0, LEFT)),
            (RoadId(1), road(|c| c.1, TurnAction::Any)),
        ])
        .unwrap();

        let mut b = LaneNetworkBuilder::new();
        let r0 = b.add_road(IntersectionId(0));
        let r1 = b.add_road(IntersectionId(0));
        let l0 = b.add_lane(r0, 60.0, TurnSet::ALL).unwrap();
        let l1 = b.add_lane(r1, 60.0, TurnSet::ALL).unwrap();
        (table, b.build(), [l0, l1])
    }

    proptest! {
        #[test]
        fn conservation_holds_for_any_tick_sequence(
            counts in prop::collection::vec((0u32..6, 0u32..6), 5),
            ticks  in prop::collection::vec(0.5f64..30.0, 1..40),
            seed   in any::<u64>(),
        ) {
            let (table, lanes, ids) = fixture(&counts);
            let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
                .seed(seed)
                .build()
                .unwrap();

            for tick_secs in ticks {
                for &lane in &ids {
                    let requests = sched.act(&lanes, lane, tick_secs).unwrap();
                    let now = sched.clock().now_secs;
                    prop_assert!(requests.iter().all(|r| r.spawn_secs <= now));

                    let queued: u64 = table
                        .roads()
                        .iter()
                        .map(|&r| sched.window().queue(r).map_or(0, |q| q.len() as u64))
                        .sum();
                    prop_assert_eq!(sched.total_scheduled() - sched.total_dispatched(), queued);
                    prop_assert!(sched.window().check_conservation().is_ok());
                    prop_assert!(sched.total_scheduled() <= table.total());
                }
            }
        }

        #[test]
        fn restricted_never_reuses_a_lane_within_a_tick(
            counts in prop::collection::vec((0u32..6, 0u32..6), 5),
            ticks  in 1usize..30,
            seed   in any::<u64>(),
        ) {
            let (table, lanes, ids) = fixture(&counts);
            let mut sched = SchedulerBuilder::new(&table, car_catalog(), TurnTable::new())
                .seed(seed)
                .tick_mode(TickMode::Explicit)
                .build_restricted(&lanes)
                .unwrap();

            for _ in 0..ticks {
                sched.begin_tick(5.0).unwrap();
                for &lane in &ids {
                    let first = sched.act(&lanes, lane, 5.0, CAR).unwrap();
                    let second = sched.act(&lanes, lane, 5.0, CAR).unwrap();
                    prop_assert!(second.is_empty());
                    prop_assert_eq!(sched.lane_used(lane), !first.is_empty());
                }
                prop_assert_eq!(
                    sched.total_scheduled() - sched.total_dispatched(),
                    sched.pending_in_current_window()
                );
            }
        }
    }
}
