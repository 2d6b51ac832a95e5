//! Tick-boundary tracking.
//!
//! # Implicit mode
//!
//! The driver never says "new tick".  The tracker remembers which spawn
//! points were serviced in the current tick; a spawn point serviced a second
//! time, or a change of tick size, starts a new tick and advances the clock
//! by the new tick size.
//!
//! **Caller precondition:** every tick visits the same set of spawn points
//! exactly once, in a stable order.  Behaviour under any other visitation
//! pattern is unspecified.
//!
//! # Explicit mode
//!
//! The driver calls [`TickTracker::begin_tick`] at every boundary and
//! revisits never start a tick.  A call made before the first `begin_tick`
//! starts the first tick.

use rustc_hash::FxHashSet;

use td_core::{LaneId, SimClock, TickMode};

use crate::{SchedError, SchedResult};

#[derive(Clone, Debug)]
pub struct TickTracker {
    mode:     TickMode,
    clock:    SimClock,
    serviced: FxHashSet<LaneId>,
    /// Spawn points serviced during the previous tick.
    previous: FxHashSet<LaneId>,
}

impl TickTracker {
    pub fn new(mode: TickMode) -> Self {
        Self {
            mode,
            clock:    SimClock::new(),
            serviced: FxHashSet::default(),
            previous: FxHashSet::default(),
        }
    }

    #[inline]
    pub fn mode(&self) -> TickMode {
        self.mode
    }

    #[inline]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// `true` if `lane` has already been serviced in the current tick.
    #[inline]
    pub fn serviced(&self, lane: LaneId) -> bool {
        self.serviced.contains(&lane)
    }

    /// `true` if `lane` was serviced during the previous tick.
    #[inline]
    pub fn serviced_last_tick(&self, lane: LaneId) -> bool {
        self.previous.contains(&lane)
    }

    /// Start the next tick, lasting `tick_secs`.
    pub fn begin_tick(&mut self, tick_secs: f64) -> SchedResult<()> {
        validate_tick(tick_secs)?;
        self.roll_over(tick_secs);
        Ok(())
    }

    /// Record a visit of `lane` with the caller's tick size.
    ///
    /// Returns `true` if the visit started a new tick.
    pub fn visit(&mut self, lane: LaneId, tick_secs: f64) -> SchedResult<bool> {
        validate_tick(tick_secs)?;
        let new_tick = match self.mode {
            TickMode::Implicit => {
                !self.clock.started()
                    || self.serviced.contains(&lane)
                    || tick_secs != self.clock.tick_secs
            }
            TickMode::Explicit => !self.clock.started(),
        };
        if new_tick {
            self.roll_over(tick_secs);
        }
        self.serviced.insert(lane);
        Ok(new_tick)
    }

    fn roll_over(&mut self, tick_secs: f64) {
        self.previous = std::mem::take(&mut self.serviced);
        self.clock.advance(tick_secs);
    }
}

fn validate_tick(tick_secs: f64) -> SchedResult<()> {
    if tick_secs.is_finite() && tick_secs > 0.0 {
        Ok(())
    } else {
        Err(SchedError::Config(format!(
            "tick size must be positive and finite, got {tick_secs}"
        )))
    }
}
