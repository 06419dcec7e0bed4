//! Forcing lookups consumed from a climate model.

use crate::timeseries::{FloatValue, Year};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The part of a climate model used by forcing targets
pub trait ClimateModel {
    /// Radiative forcing of `gas` in `year`
    /// unit: W / m^2
    fn forcing(&self, gas: &str, year: Year) -> FloatValue;
}

/// Forcing values held in memory, keyed by gas then year.
///
/// Gases or years without an entry have zero forcing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForcingTable {
    forcings: BTreeMap<String, BTreeMap<Year, FloatValue>>,
}

impl ForcingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forcing(mut self, gas: &str, year: Year, value: FloatValue) -> Self {
        self.set_forcing(gas, year, value);
        self
    }

    pub fn set_forcing(&mut self, gas: &str, year: Year, value: FloatValue) {
        self.forcings
            .entry(gas.to_string())
            .or_default()
            .insert(year, value);
    }
}

impl ClimateModel for ForcingTable {
    fn forcing(&self, gas: &str, year: Year) -> FloatValue {
        self.forcings
            .get(gas)
            .and_then(|series| series.get(&year))
            .copied()
            .unwrap_or(0.0)
    }
}
