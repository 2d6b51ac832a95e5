//! Strongly typed, zero-cost identifier wrappers.
//!
//! Collaborator objects (roads, lanes, intersections, vehicle classes) are
//! never referenced by identity; every cache and queue in the scheduler is
//! keyed by these arena indices.  All IDs are `Copy + Ord + Hash` so they can
//! be used as map keys and sorted collection elements without ceremony.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — the inner type's `MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// A directed road approaching an intersection (a "road-direction").
    /// Demand counts, spawn queues, and destinations are all per `RoadId`.
    pub struct RoadId(u32);
}

typed_id! {
    /// A single lane of a road.  Spawn points are identified by their lane.
    pub struct LaneId(u32);
}

typed_id! {
    /// The intersection a road leads into.
    pub struct IntersectionId(u32);
}

typed_id! {
    /// Vehicle class used by lane-level turn restrictions (e.g. car, bus).
    pub struct VehicleClassId(u16);
}

typed_id! {
    /// Index of a vehicle specification in the `VehicleCatalog`.
    pub struct VehicleSpecId(u16);
}
