//! Fluent builder for both schedulers.

use rustc_hash::FxHashSet;

use td_core::{RunConfig, SimRng, TickMode, TurnWeights, VehicleCatalog};
use td_demand::DemandTable;
use td_lanes::{DestinationSelector, LaneModel};

use crate::{
    DemandScheduler, DemandWindow, EligibilityCache, LanePolicy, LatenessLog,
    RestrictedDemandScheduler, SchedError, SchedResult, TickTracker,
};

/// Fluent builder for [`DemandScheduler`] and [`RestrictedDemandScheduler`].
///
/// # Required inputs
///
/// - [`DemandTable`] — borrowed for the scheduler's lifetime
/// - [`VehicleCatalog`] — the specs instantiated per dispatched event
/// - `D: DestinationSelector` — e.g. [`td_lanes::TurnTable`]
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                     |
/// |---------------------|-----------------------------|
/// | `.seed(s)`          | 0                           |
/// | `.turn_weights(w)`  | `TurnWeights::UNIFORM`      |
/// | `.tick_mode(m)`     | `TickMode::Implicit`        |
/// | `.lane_policy(p)`   | `LanePolicy::AnyEligible`   |
/// | `.config(&c)`       | sets seed and tick mode     |
///
/// # Example
///
/// ```rust,ignore
/// let mut sched = SchedulerBuilder::new(&table, catalog, turns)
///     .config(&run_config)
///     .lane_policy(LanePolicy::LeastCongested)
///     .build_restricted(&lanes)?;
/// let requests = sched.act(&lanes, LaneId(0), 10.0, VehicleClassId(0))?;
/// ```
pub struct SchedulerBuilder<'a, D: DestinationSelector> {
    table:        &'a DemandTable,
    catalog:      VehicleCatalog,
    destinations: D,
    seed:         u64,
    weights:      TurnWeights,
    tick_mode:    TickMode,
    policy:       LanePolicy,
}

impl<'a, D: DestinationSelector> SchedulerBuilder<'a, D> {
    pub fn new(table: &'a DemandTable, catalog: VehicleCatalog, destinations: D) -> Self {
        Self {
            table,
            catalog,
            destinations,
            seed:      0,
            weights:   TurnWeights::UNIFORM,
            tick_mode: TickMode::Implicit,
            policy:    LanePolicy::AnyEligible,
        }
    }

    /// Seed the scheduler's RNG.  The same seed, table, and call sequence
    /// always produce the same requests.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Weights for resolving compound turn actions.
    pub fn turn_weights(mut self, weights: TurnWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn tick_mode(mut self, mode: TickMode) -> Self {
        self.tick_mode = mode;
        self
    }

    /// Only used by [`build_restricted`](Self::build_restricted).
    pub fn lane_policy(mut self, policy: LanePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Take seed and tick mode from a run configuration.
    pub fn config(self, config: &RunConfig) -> Self {
        self.seed(config.seed).tick_mode(config.tick_mode)
    }

    /// Build the unrestricted scheduler.
    pub fn build(self) -> SchedResult<DemandScheduler<'a, D>> {
        Ok(DemandScheduler {
            window:       DemandWindow::new(self.table, self.weights),
            ticks:        TickTracker::new(self.tick_mode),
            rng:          SimRng::new(self.seed),
            catalog:      self.catalog,
            destinations: self.destinations,
        })
    }

    /// Build the lane-restricted scheduler.
    ///
    /// # Errors
    ///
    /// [`SchedError::Precondition`] if `lanes` allows lane changing.
    pub fn build_restricted<L: LaneModel>(
        self,
        lanes: &L,
    ) -> SchedResult<RestrictedDemandScheduler<'a, D>> {
        if lanes.lane_changing_allowed() {
            return Err(SchedError::Precondition(
                "restricted scheduling requires lane changing to be disabled".into(),
            ));
        }
        let mut cache = EligibilityCache::new();
        cache.sync(lanes.restriction_epoch());
        Ok(RestrictedDemandScheduler {
            window:       DemandWindow::new(self.table, self.weights),
            ticks:        TickTracker::new(self.tick_mode),
            rng:          SimRng::new(self.seed),
            catalog:      self.catalog,
            destinations: self.destinations,
            policy:       self.policy,
            cache,
            used:         FxHashSet::default(),
            lateness:     LatenessLog::new(),
        })
    }
}
