//! `TimeBucket` — one road's turn-movement counts for one interval.
//!
//! # Lifecycle
//!
//! A bucket is created with only its start offset while demand data is being
//! ingested.  Counts are added one action at a time, and the duration is
//! fixed exactly once by [`TimeBucket::close`] when the next bucket's offset
//! for the same road becomes known.  Until then the bucket is *unbounded*
//! (`duration_secs == f64::INFINITY`).  Once inside a `DemandTable` it is only
//! reachable through shared references.

use td_core::TurnAction;

use crate::{DemandError, DemandResult};

#[derive(Clone, Debug, PartialEq)]
pub struct TimeBucket {
    /// Seconds from the demand epoch.  Never negative.
    start_secs: f64,
    /// `f64::INFINITY` until closed.
    duration_secs: f64,
    /// Counts per action, in insertion order.  Actions are unique.
    counts: Vec<(TurnAction, u32)>,
    /// Memoised sum of `counts`.
    total: u64,
}

impl TimeBucket {
    /// An open bucket starting at `start_secs`.
    ///
    /// # Errors
    ///
    /// [`DemandError::NegativeOffset`] if `start_secs` is negative or not
    /// finite.
    pub fn new(start_secs: f64) -> DemandResult<Self> {
        if !(start_secs.is_finite() && start_secs >= 0.0) {
            return Err(DemandError::NegativeOffset(start_secs));
        }
        Ok(Self {
            start_secs,
            duration_secs: f64::INFINITY,
            counts: Vec::new(),
            total: 0,
        })
    }

    /// Convenience: an already-closed bucket with the given counts.
    pub fn with_counts(
        start_secs:    f64,
        duration_secs: f64,
        counts:        &[(TurnAction, u32)],
    ) -> DemandResult<Self> {
        let mut bucket = Self::new(start_secs)?;
        for &(action, n) in counts {
            bucket.add_count(action, n)?;
        }
        bucket.close(start_secs + duration_secs)?;
        Ok(bucket)
    }

    /// Record `count` vehicles performing `action` during this interval.
    ///
    /// # Errors
    ///
    /// [`DemandError::DuplicateAction`] if `action` already has a count.
    pub fn add_count(&mut self, action: TurnAction, count: u32) -> DemandResult<()> {
        if self.counts.iter().any(|(a, _)| *a == action) {
            return Err(DemandError::DuplicateAction { action, start: self.start_secs });
        }
        self.counts.push((action, count));
        self.total += count as u64;
        Ok(())
    }

    /// Fix the duration so the bucket ends at `end_secs`.
    ///
    /// # Errors
    ///
    /// - [`DemandError::AlreadyClosed`] on a second call.
    /// - [`DemandError::NegativeDuration`] if `end_secs < start_secs` or is
    ///   not finite.
    pub fn close(&mut self, end_secs: f64) -> DemandResult<()> {
        if self.is_closed() {
            return Err(DemandError::AlreadyClosed { start: self.start_secs });
        }
        if !(end_secs.is_finite() && end_secs >= self.start_secs) {
            return Err(DemandError::NegativeDuration { start: self.start_secs, end: end_secs });
        }
        self.duration_secs = end_secs - self.start_secs;
        Ok(())
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.duration_secs.is_finite()
    }

    #[inline]
    pub fn start_secs(&self) -> f64 {
        self.start_secs
    }

    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    #[inline]
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// `true` if `t` lies in `[start, start + duration)`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.start_secs <= t && t < self.end_secs()
    }

    /// Total vehicles across all actions.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Read-only `(action, count)` pairs in insertion order.
    pub fn counts(&self) -> &[(TurnAction, u32)] {
        &self.counts
    }

    /// Count recorded for `action`, or 0.
    pub fn count(&self, action: TurnAction) -> u32 {
        self.counts
            .iter()
            .find(|(a, _)| *a == action)
            .map_or(0, |&(_, n)| n)
    }

    /// The multiset of actions this bucket partitions its total into:
    /// each action repeated `count` times.
    pub fn action_pool(&self) -> Vec<TurnAction> {
        let mut pool = Vec::with_capacity(self.total as usize);
        for &(action, n) in &self.counts {
            pool.extend(std::iter::repeat_n(action, n as usize));
        }
        pool
    }
}
