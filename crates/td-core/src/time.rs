//! Simulation time model.
//!
//! # Design
//!
//! The driver advances the simulation in ticks of caller-supplied size (in
//! seconds).  Tick sizes may differ from one tick to the next, so the clock
//! tracks two things separately:
//!
//! - `tick`: a monotonically increasing `Tick` counter, and
//! - `now_secs`: the simulated time in seconds since the demand epoch.
//!
//! `now_secs` is the **end** of the current tick.  A tick of size `s` ending
//! at `c` covers the half-open interval `(c − s, c]`; the first tick therefore
//! ends at `0 + s`.  An event scheduled for time `t` is due in the first tick
//! whose end is `≥ t`.

use std::fmt;

use crate::{TdError, TdResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── TickMode ──────────────────────────────────────────────────────────────────

/// How the scheduler learns that a new tick has begun.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TickMode {
    /// Infer tick boundaries: a spawn point serviced twice, or a change of
    /// tick size, starts a new tick.  Requires the driver to visit the same
    /// spawn points once per tick in a stable order.
    #[default]
    Implicit,
    /// The driver calls `begin_tick` explicitly; revisits never start a tick.
    Explicit,
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Simulated time as seen by a scheduler.
///
/// Holds no heap data.  Before the first tick begins, `now_secs` is the
/// demand epoch (0) and [`started`](Self::started) is `false`.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// The current tick — `Tick(0)` is the first tick.
    pub current_tick: Tick,
    /// End of the current tick, in seconds since the demand epoch.
    pub now_secs: f64,
    /// Size of the current tick in seconds (0 before the first tick).
    pub tick_secs: f64,
    started: bool,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once the first tick has begun.
    #[inline]
    pub fn started(&self) -> bool {
        self.started
    }

    /// Begin the next tick, lasting `tick_secs` seconds.
    #[inline]
    pub fn advance(&mut self, tick_secs: f64) {
        if self.started {
            self.current_tick = self.current_tick + 1;
        } else {
            self.started = true;
        }
        self.tick_secs = tick_secs;
        self.now_secs += tick_secs;
    }

    /// Break elapsed time into (day, hour, minute) components.
    /// Useful for human-readable logging without a datetime library.
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_secs = self.now_secs.max(0.0) as u64;
        let days = total_secs / 86_400;
        let hours = ((total_secs % 86_400) / 3_600) as u32;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        (days, hours, minutes)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m) = self.elapsed_dhm();
        write!(f, "{} (day {} {:02}:{:02})", self.current_tick, d, h, m)
    }
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically loaded from a JSON file by the application crate and passed to
/// the scheduler builder and the driver loop.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunConfig {
    /// Seconds per tick.  Must be positive and finite.
    pub tick_secs: f64,

    /// Total ticks to drive.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical spawns.
    pub seed: u64,

    /// Implicit (visited-set) or explicit tick boundaries.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tick_mode: TickMode,

    /// Write a tick summary every N ticks.  1 = every tick; 0 = never.
    pub output_interval_ticks: u64,
}

impl RunConfig {
    /// The tick at which the run ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Reject non-positive or non-finite tick sizes.
    pub fn validate(&self) -> TdResult<()> {
        if !(self.tick_secs.is_finite() && self.tick_secs > 0.0) {
            return Err(TdError::Config(format!(
                "tick_secs must be positive and finite, got {}",
                self.tick_secs
            )));
        }
        Ok(())
    }
}
