//! Deterministic, explicitly owned RNG.
//!
//! # Determinism strategy
//!
//! Every scheduler instance owns exactly one `SimRng` seeded from the run's
//! master seed.  There is no global generator: the uniform spawn-time draw,
//! the without-replacement direction draw, compound-turn resolution, and the
//! vehicle shuffle all pull from the instance's own stream, so a run is
//! reproducible from its seed and tests can pin the exact sequence.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Scheduler-level RNG.
///
/// `!Sync` by construction: the scheduler is single-threaded and the RNG is
/// never shared.
#[derive(Clone, Debug)]
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// A time drawn uniformly from `[start, start + duration)`.
    ///
    /// A zero-length interval collapses to `start`.
    #[inline]
    pub fn uniform_secs(&mut self, start: f64, duration: f64) -> f64 {
        if duration > 0.0 {
            self.0.gen_range(start..start + duration)
        } else {
            start
        }
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
