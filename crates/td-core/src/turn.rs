//! Turn directions and the (possibly compound) turn actions found in counts.
//!
//! Historical turn-movement counts are sometimes recorded against a shared
//! movement ("straight or left") rather than a single manoeuvre.  Such a
//! compound [`TurnAction`] is resolved to one concrete [`TurnDirection`] when
//! the individual spawn event is created, by a weighted draw over the
//! directions it covers.

use std::fmt;
use std::str::FromStr;

use crate::{SimRng, TdError, TdResult};

// ── TurnDirection ─────────────────────────────────────────────────────────────

/// A concrete manoeuvre at the next intersection.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TurnDirection {
    Left,
    Straight,
    Right,
    UTurn,
}

impl TurnDirection {
    pub const ALL: [TurnDirection; 4] = [
        TurnDirection::Left,
        TurnDirection::Straight,
        TurnDirection::Right,
        TurnDirection::UTurn,
    ];

    /// Dense index in `0..4`, used by `TurnWeights` and `TurnSet`.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            TurnDirection::Left     => 0,
            TurnDirection::Straight => 1,
            TurnDirection::Right    => 2,
            TurnDirection::UTurn    => 3,
        }
    }

    /// Label used in CSV headers and output columns.
    pub fn as_str(self) -> &'static str {
        match self {
            TurnDirection::Left     => "left",
            TurnDirection::Straight => "straight",
            TurnDirection::Right    => "right",
            TurnDirection::UTurn    => "u_turn",
        }
    }
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TurnDirection {
    type Err = TdError;

    fn from_str(s: &str) -> TdResult<Self> {
        match TurnAction::from_str(s)? {
            TurnAction::Turn(d) => Ok(d),
            other => Err(TdError::Parse(format!(
                "{other} is a compound action, expected a single direction"
            ))),
        }
    }
}

// ── TurnAction ────────────────────────────────────────────────────────────────

/// A counted movement: either a single direction or a shared movement that
/// covers several.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum TurnAction {
    Turn(TurnDirection),
    StraightOrLeft,
    StraightOrRight,
    LeftOrRight,
    /// Any of the four directions.
    Any,
}

impl TurnAction {
    /// The concrete directions this action may resolve to.
    pub fn options(self) -> &'static [TurnDirection] {
        use TurnDirection::*;
        match self {
            TurnAction::Turn(Left)      => &[Left],
            TurnAction::Turn(Straight)  => &[Straight],
            TurnAction::Turn(Right)     => &[Right],
            TurnAction::Turn(UTurn)     => &[UTurn],
            TurnAction::StraightOrLeft  => &[Straight, Left],
            TurnAction::StraightOrRight => &[Straight, Right],
            TurnAction::LeftOrRight     => &[Left, Right],
            TurnAction::Any             => &TurnDirection::ALL,
        }
    }

    /// Resolve to one concrete direction by a weighted draw over
    /// [`options`](Self::options).
    ///
    /// Concrete actions never touch the RNG.  If every option has zero
    /// weight the draw falls back to uniform.
    pub fn resolve(self, weights: &TurnWeights, rng: &mut SimRng) -> TurnDirection {
        let options = self.options();
        if let [only] = options {
            return *only;
        }

        let total: f64 = options.iter().map(|&d| weights.weight(d)).sum();
        if total <= 0.0 {
            return *rng.choose(options).unwrap_or(&options[0]);
        }

        let mut r = rng.gen_range(0.0..total);
        for &d in options {
            let w = weights.weight(d);
            if r < w {
                return d;
            }
            r -= w;
        }
        // Floating-point residue lands on the last positive-weight option.
        options
            .iter()
            .rev()
            .copied()
            .find(|&d| weights.weight(d) > 0.0)
            .unwrap_or(options[0])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TurnAction::Turn(d)         => d.as_str(),
            TurnAction::StraightOrLeft  => "straight_or_left",
            TurnAction::StraightOrRight => "straight_or_right",
            TurnAction::LeftOrRight     => "left_or_right",
            TurnAction::Any             => "any",
        }
    }
}

impl From<TurnDirection> for TurnAction {
    fn from(d: TurnDirection) -> Self {
        TurnAction::Turn(d)
    }
}

impl fmt::Display for TurnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TurnAction {
    type Err = TdError;

    fn from_str(s: &str) -> TdResult<Self> {
        let action = match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l"                  => TurnAction::Turn(TurnDirection::Left),
            "straight" | "s" | "through"  => TurnAction::Turn(TurnDirection::Straight),
            "right" | "r"                 => TurnAction::Turn(TurnDirection::Right),
            "u_turn" | "uturn" | "u"      => TurnAction::Turn(TurnDirection::UTurn),
            "straight_or_left"            => TurnAction::StraightOrLeft,
            "straight_or_right"           => TurnAction::StraightOrRight,
            "left_or_right"               => TurnAction::LeftOrRight,
            "any"                         => TurnAction::Any,
            other => {
                return Err(TdError::Parse(format!("unknown turn action {other:?}")));
            }
        };
        Ok(action)
    }
}

// ── TurnWeights ───────────────────────────────────────────────────────────────

/// Relative weight of each concrete direction when resolving compound
/// actions.  Defaults to equal weights.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnWeights([f64; 4]);

impl TurnWeights {
    /// Equal weight for every direction.
    pub const UNIFORM: TurnWeights = TurnWeights([1.0; 4]);

    /// Build from `[left, straight, right, u_turn]`.
    ///
    /// Weights must be finite and non-negative.
    pub fn new(weights: [f64; 4]) -> TdResult<Self> {
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(TdError::Config(format!(
                "turn weights must be finite and non-negative, got {bad}"
            )));
        }
        Ok(Self(weights))
    }

    #[inline]
    pub fn weight(&self, d: TurnDirection) -> f64 {
        self.0[d.index()]
    }
}

impl Default for TurnWeights {
    fn default() -> Self {
        Self::UNIFORM
    }
}

// ── TurnSet ───────────────────────────────────────────────────────────────────

/// A small bitset of concrete directions (lane turn permissions).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnSet(u8);

impl TurnSet {
    pub const EMPTY: TurnSet = TurnSet(0);
    pub const ALL: TurnSet = TurnSet(0b1111);

    /// The set containing exactly the directions in `dirs`.
    pub fn of(dirs: &[TurnDirection]) -> Self {
        dirs.iter().fold(Self::EMPTY, |s, &d| s.with(d))
    }

    #[inline]
    pub fn with(self, d: TurnDirection) -> Self {
        TurnSet(self.0 | (1 << d.index()))
    }

    #[inline]
    pub fn contains(self, d: TurnDirection) -> bool {
        self.0 & (1 << d.index()) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = TurnDirection> {
        TurnDirection::ALL.into_iter().filter(move |&d| self.contains(d))
    }
}
