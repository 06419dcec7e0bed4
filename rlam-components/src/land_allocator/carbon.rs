//! Land-use-change carbon for a single land leaf.
//!
//! Each leaf tracks an above-ground (vegetation) and a below-ground (soil)
//! carbon stock for every year from the carbon start year. A year is solved in
//! three phases which the land allocator runs across all leaves in turn:
//!
//! 1. **Flows out**: land leaving the use takes a proportional part of both
//!    stocks with it. The removed carbon and the land are recorded in the
//!    [`CarbonFlowLedger`].
//! 2. **Flows in**: land joining the use inherits the released soil carbon in
//!    proportion to its share of all land gained that year.
//! 3. **Box model**: vegetation regrows toward `land * density` over the
//!    mature age, soil relaxes toward its equilibrium over the soil time scale.
//!
//! The leaf's emission for the year is the decline of its total stock. Soil
//! carbon handed between leaves cancels in the ledger total, above-ground
//! carbon on cleared land is released.
//!
//! Every year is solved from the stored stocks of the previous year, so a year
//! can be recomputed any number of times with the same result.

use super::ledger::CarbonFlowLedger;
use rlam_core::timeseries::{FloatValue, Period, PeriodVector, Year, YearVector};
use serde::{Deserialize, Serialize};

/// Parameters of the per-leaf carbon box model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonParameters {
    /// E-folding time of vegetation regrowth on newly gained land
    /// unit: yr
    /// default: 30.0
    pub mature_age: FloatValue,
    /// E-folding time of soil carbon toward its equilibrium
    /// unit: yr
    /// default: 40.0
    pub soil_time_scale: FloatValue,
}

impl Default for CarbonParameters {
    fn default() -> Self {
        Self {
            mature_age: 30.0,
            soil_time_scale: 40.0,
        }
    }
}

impl CarbonParameters {
    /// Fraction of the gap to equilibrium vegetation closed in one year
    pub fn regrowth_rate(&self) -> FloatValue {
        annual_relaxation(self.mature_age)
    }

    /// Fraction of the gap to equilibrium soil carbon closed in one year
    pub fn soil_relaxation_rate(&self) -> FloatValue {
        annual_relaxation(self.soil_time_scale)
    }
}

fn annual_relaxation(time_scale: FloatValue) -> FloatValue {
    if time_scale > 0.0 {
        1.0 - (-1.0 / time_scale).exp()
    } else {
        1.0
    }
}

/// Carbon stocks and flows of one land leaf
#[derive(Debug, Clone)]
pub struct LandCarbon {
    parameters: CarbonParameters,
    /// unit: carbon per unit land
    above_ground_density: PeriodVector<FloatValue>,
    /// unit: carbon per unit land
    below_ground_density: PeriodVector<FloatValue>,
    above_ground_stock: YearVector<FloatValue>,
    below_ground_stock: YearVector<FloatValue>,
    land_change: YearVector<FloatValue>,
    emissions: YearVector<FloatValue>,
}

impl LandCarbon {
    pub fn new(
        parameters: CarbonParameters,
        above_ground_density: PeriodVector<FloatValue>,
        below_ground_density: PeriodVector<FloatValue>,
        start_year: Year,
        end_year: Year,
    ) -> Self {
        Self {
            parameters,
            above_ground_density,
            below_ground_density,
            above_ground_stock: YearVector::new(start_year, end_year),
            below_ground_stock: YearVector::new(start_year, end_year),
            land_change: YearVector::new(start_year, end_year),
            emissions: YearVector::new(start_year, end_year),
        }
    }

    pub fn parameters(&self) -> &CarbonParameters {
        &self.parameters
    }

    /// Set the carbon densities for `period` and all later periods
    pub fn set_carbon_content(
        &mut self,
        above_ground: FloatValue,
        below_ground: FloatValue,
        period: Period,
    ) {
        self.above_ground_density.set_from(period, above_ground);
        self.below_ground_density.set_from(period, below_ground);
    }

    pub fn above_ground_density(&self, period: Period) -> FloatValue {
        self.above_ground_density[period]
    }

    pub fn below_ground_density(&self, period: Period) -> FloatValue {
        self.below_ground_density[period]
    }

    pub fn start_year(&self) -> Year {
        self.above_ground_stock.start_year()
    }

    pub fn above_ground_stock(&self, year: Year) -> FloatValue {
        self.above_ground_stock[year]
    }

    pub fn below_ground_stock(&self, year: Year) -> FloatValue {
        self.below_ground_stock[year]
    }

    pub fn total_stock(&self, year: Year) -> FloatValue {
        self.above_ground_stock[year] + self.below_ground_stock[year]
    }

    pub fn land_change(&self, year: Year) -> FloatValue {
        self.land_change[year]
    }

    /// Net emission of this leaf in `year`, positive for a release
    pub fn emission(&self, year: Year) -> FloatValue {
        self.emissions[year]
    }

    /// First phase: remove carbon from land leaving this use.
    ///
    /// In the first carbon year the stocks are initialized at equilibrium.
    pub(crate) fn calc_flows_out(
        &mut self,
        year: Year,
        land: FloatValue,
        previous_land: FloatValue,
        period: Period,
        ledger: &mut CarbonFlowLedger,
    ) {
        if year == self.start_year() {
            self.above_ground_stock[year] = land * self.above_ground_density[period];
            self.below_ground_stock[year] = land * self.below_ground_density[period];
            self.land_change[year] = 0.0;
            return;
        }

        let previous_above = self.above_ground_stock[year - 1];
        let previous_below = self.below_ground_stock[year - 1];
        let change = land - previous_land;
        self.land_change[year] = change;

        if change < 0.0 && previous_land > 0.0 {
            let lost_fraction = (-change / previous_land).min(1.0);
            let removed_above = previous_above * lost_fraction;
            let removed_below = previous_below * lost_fraction;
            self.above_ground_stock[year] = previous_above - removed_above;
            self.below_ground_stock[year] = previous_below - removed_below;
            ledger.add_flows_out(removed_above, removed_below, -change);
        } else {
            self.above_ground_stock[year] = previous_above;
            self.below_ground_stock[year] = previous_below;
            if change > 0.0 {
                ledger.add_land_gained(change);
            }
        }
    }

    /// Second phase: receive soil carbon from land converted into this use.
    ///
    /// Requires the flows out of every leaf for the year to be in the ledger.
    pub(crate) fn calc_flows_in(&mut self, year: Year, ledger: &mut CarbonFlowLedger) {
        if year == self.start_year() {
            return;
        }
        let change = self.land_change[year];
        let land_gained = ledger.land_gained();
        if change > 0.0 && land_gained > 0.0 {
            let transferred = ledger.below_ground_released() * change / land_gained;
            self.below_ground_stock[year] += transferred;
            ledger.add_flows_in(transferred);
        }
    }

    /// Third phase: relax the stocks toward equilibrium and record the emission
    pub(crate) fn calc_box_model(
        &mut self,
        year: Year,
        land: FloatValue,
        period: Period,
        ledger: &mut CarbonFlowLedger,
    ) {
        if year == self.start_year() {
            self.emissions[year] = 0.0;
            return;
        }

        let equilibrium_above = land * self.above_ground_density[period];
        let equilibrium_below = land * self.below_ground_density[period];

        let mut above = self.above_ground_stock[year];
        if above < equilibrium_above {
            above += (equilibrium_above - above) * self.parameters.regrowth_rate();
        } else {
            // Vegetation is lost as soon as the land can no longer hold it
            above = equilibrium_above;
        }

        let mut below = self.below_ground_stock[year];
        below += (equilibrium_below - below) * self.parameters.soil_relaxation_rate();

        let above = above.max(0.0);
        let below = below.max(0.0);
        self.above_ground_stock[year] = above;
        self.below_ground_stock[year] = below;

        let emission = self.total_stock(year - 1) - (above + below);
        self.emissions[year] = emission;
        ledger.add_emission(emission);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    fn carbon() -> LandCarbon {
        LandCarbon::new(
            CarbonParameters::default(),
            PeriodVector::filled(2, 10.0),
            PeriodVector::filled(2, 20.0),
            2000,
            2010,
        )
    }

    /// Run all three phases for a single leaf
    fn solve(
        carbon: &mut LandCarbon,
        year: Year,
        land: FloatValue,
        previous: FloatValue,
    ) -> FloatValue {
        let mut ledger = CarbonFlowLedger::new();
        ledger.reset(year);
        carbon.calc_flows_out(year, land, previous, 0, &mut ledger);
        carbon.calc_flows_in(year, &mut ledger);
        carbon.calc_box_model(year, land, 0, &mut ledger);
        ledger.net_emission(year).unwrap()
    }

    #[test]
    fn first_year_is_equilibrium() {
        let mut carbon = carbon();
        assert_eq!(solve(&mut carbon, 2000, 5.0, 5.0), 0.0);
        assert_eq!(carbon.above_ground_stock(2000), 50.0);
        assert_eq!(carbon.below_ground_stock(2000), 100.0);
    }

    #[test]
    fn constant_land_has_no_emission() {
        let mut carbon = carbon();
        solve(&mut carbon, 2000, 5.0, 5.0);
        for year in 2001..=2010 {
            let emission = solve(&mut carbon, year, 5.0, 5.0);
            assert!(is_close!(emission, 0.0, abs_tol = 1e-12));
        }
    }

    #[test]
    fn clearing_releases_vegetation_immediately() {
        let mut carbon = carbon();
        solve(&mut carbon, 2000, 5.0, 5.0);
        let emission = solve(&mut carbon, 2001, 3.0, 5.0);

        // Above ground carbon on two units of land is lost, soil leaves with the land
        assert!(is_close!(carbon.above_ground_stock(2001), 30.0));
        assert!(is_close!(carbon.below_ground_stock(2001), 60.0));
        assert!(is_close!(emission, 60.0));
        assert_eq!(carbon.land_change(2001), -2.0);
    }

    #[test]
    fn expansion_regrows_slowly() {
        let mut carbon = carbon();
        solve(&mut carbon, 2000, 5.0, 5.0);
        let emission = solve(&mut carbon, 2001, 6.0, 5.0);

        // Uptake is negative emission and smaller than the equilibrium gain of 30
        assert!(emission < 0.0);
        assert!(-emission < 30.0);
        assert!(carbon.above_ground_stock(2001) < 60.0);
        assert!(carbon.above_ground_stock(2001) > 50.0);
    }

    #[test]
    fn recomputing_a_year_is_idempotent() {
        let mut carbon = carbon();
        solve(&mut carbon, 2000, 5.0, 5.0);
        let first = solve(&mut carbon, 2001, 4.0, 5.0);
        let stock = carbon.total_stock(2001);
        let second = solve(&mut carbon, 2001, 4.0, 5.0);
        assert_eq!(first, second);
        assert_eq!(stock, carbon.total_stock(2001));
    }

    #[test]
    fn zero_time_scale_relaxes_in_one_year() {
        let parameters = CarbonParameters {
            mature_age: 0.0,
            soil_time_scale: 0.0,
        };
        assert_eq!(parameters.regrowth_rate(), 1.0);
        assert_eq!(parameters.soil_relaxation_rate(), 1.0);
    }
}
