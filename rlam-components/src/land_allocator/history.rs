use rlam_core::timeseries::{FloatValue, Year};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Historical land allocation before the first model period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandUseHistory {
    allocations: BTreeMap<Year, FloatValue>,
}

impl LandUseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allocation(mut self, year: Year, allocation: FloatValue) -> Self {
        self.allocations.insert(year, allocation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    pub fn last_year(&self) -> Option<Year> {
        self.allocations.keys().next_back().copied()
    }

    /// Allocation in `year`, linearly interpolated between historical points
    /// and held constant outside of them.
    pub fn allocation(&self, year: Year) -> Option<FloatValue> {
        let before = self.allocations.range(..=year).next_back();
        let after = self.allocations.range(year..).next();
        match (before, after) {
            (Some((y0, v0)), Some((y1, v1))) if y1 > y0 => {
                let fraction = (year - y0) as FloatValue / (y1 - y0) as FloatValue;
                Some(v0 + (v1 - v0) * fraction)
            }
            (Some((_, v)), _) | (None, Some((_, v))) => Some(*v),
            (None, None) => None,
        }
    }
}
