//! Vehicle specifications handed to the simulator with each spawn request.
//!
//! The scheduler never simulates vehicles; it only needs an enumerable list
//! of specifications to instantiate per dispatched event, and the class each
//! one belongs to for lane-restriction lookups.

use crate::{TdError, TdResult, VehicleClassId, VehicleSpecId};

/// One kind of vehicle the simulator can instantiate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleSpec {
    pub name: String,
    pub class: VehicleClassId,
    /// Body length in metres.
    pub length_m: f32,
    /// Top speed in metres per second.
    pub max_speed_mps: f32,
}

/// Validated, immutable list of [`VehicleSpec`]s indexed by `VehicleSpecId`.
#[derive(Clone, Debug)]
pub struct VehicleCatalog {
    specs: Vec<VehicleSpec>,
}

impl VehicleCatalog {
    /// Validate and wrap `specs`.
    ///
    /// # Errors
    ///
    /// `TdError::Config` if the list is empty, longer than `u16::MAX`, or any
    /// spec declares a zero, negative, or non-finite length or speed.
    pub fn new(specs: Vec<VehicleSpec>) -> TdResult<Self> {
        if specs.is_empty() {
            return Err(TdError::Config("vehicle catalog is empty".into()));
        }
        if specs.len() > u16::MAX as usize {
            return Err(TdError::Config(format!(
                "vehicle catalog has {} specs, at most {} supported",
                specs.len(),
                u16::MAX
            )));
        }
        for spec in &specs {
            if !(spec.length_m.is_finite() && spec.length_m > 0.0) {
                return Err(TdError::Config(format!(
                    "vehicle {:?}: length must be positive, got {}",
                    spec.name, spec.length_m
                )));
            }
            if !(spec.max_speed_mps.is_finite() && spec.max_speed_mps > 0.0) {
                return Err(TdError::Config(format!(
                    "vehicle {:?}: max speed must be positive, got {}",
                    spec.name, spec.max_speed_mps
                )));
            }
        }
        Ok(Self { specs })
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, id: VehicleSpecId) -> TdResult<&VehicleSpec> {
        self.specs
            .get(id.index())
            .ok_or(TdError::VehicleSpecNotFound(id))
    }

    /// All spec IDs, in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = VehicleSpecId> + '_ {
        (0..self.specs.len()).map(|i| VehicleSpecId(i as u16))
    }

    /// IDs of every spec belonging to `class`, in catalog order.
    pub fn ids_of_class(&self, class: VehicleClassId) -> Vec<VehicleSpecId> {
        self.specs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.class == class)
            .map(|(i, _)| VehicleSpecId(i as u16))
            .collect()
    }
}
