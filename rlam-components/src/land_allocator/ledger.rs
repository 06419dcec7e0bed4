use rlam_core::errors::{RLAMError, RLAMResult};
use rlam_core::timeseries::{FloatValue, Year};

/// Accumulates the land-use-change carbon flows of a single year across every
/// land leaf.
///
/// The ledger must be [`reset`](CarbonFlowLedger::reset) before each year's
/// flows are calculated and its totals are only reported for that year.
/// A run owns one ledger and passes it by `&mut` through the yearly phases,
/// so concurrent scenarios never share one.
#[derive(Debug, Clone, Default)]
pub struct CarbonFlowLedger {
    year: Option<Year>,
    above_ground_released: FloatValue,
    below_ground_released: FloatValue,
    below_ground_transferred: FloatValue,
    land_released: FloatValue,
    land_gained: FloatValue,
    net_emission: FloatValue,
}

impl CarbonFlowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all totals and start accumulating `year`
    pub fn reset(&mut self, year: Year) {
        *self = Self {
            year: Some(year),
            ..Self::default()
        };
    }

    /// Year the ledger was last reset for
    pub fn year(&self) -> Option<Year> {
        self.year
    }

    /// Carbon and land leaving a land use
    pub fn add_flows_out(
        &mut self,
        above_ground: FloatValue,
        below_ground: FloatValue,
        land: FloatValue,
    ) {
        self.above_ground_released += above_ground;
        self.below_ground_released += below_ground;
        self.land_released += land;
    }

    pub fn add_land_gained(&mut self, land: FloatValue) {
        self.land_gained += land;
    }

    /// Below-ground carbon carried into a land use with the converted land
    pub fn add_flows_in(&mut self, below_ground: FloatValue) {
        self.below_ground_transferred += below_ground;
    }

    pub fn add_emission(&mut self, emission: FloatValue) {
        self.net_emission += emission;
    }

    pub fn above_ground_released(&self) -> FloatValue {
        self.above_ground_released
    }

    pub fn below_ground_released(&self) -> FloatValue {
        self.below_ground_released
    }

    pub fn below_ground_transferred(&self) -> FloatValue {
        self.below_ground_transferred
    }

    pub fn land_released(&self) -> FloatValue {
        self.land_released
    }

    pub fn land_gained(&self) -> FloatValue {
        self.land_gained
    }

    /// Net land-use-change emission accumulated for `year`.
    ///
    /// Positive values are a release to the atmosphere.
    pub fn net_emission(&self, year: Year) -> RLAMResult<FloatValue> {
        match self.year {
            Some(current) if current == year => Ok(self.net_emission),
            expected => Err(RLAMError::LedgerYearMismatch {
                expected,
                found: year,
            }),
        }
    }
}
