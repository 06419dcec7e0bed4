use super::{Target, TargetYear};
use rlam_core::climate::ClimateModel;
use rlam_core::errors::{RLAMError, RLAMResult};
use rlam_core::modeltime::ModelTime;
use rlam_core::timeseries::{FloatValue, Year};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Forcing agents covered by the Kyoto basket
pub const KYOTO_GASES: [&str; 12] = [
    "CO2",
    "CH4",
    "N2O",
    "HCFC125",
    "HCFC134A",
    "HCFC143A",
    "HFC227ea",
    "HCFC245fa",
    "SF6",
    "CF4",
    "C2F6",
    "OtherHC",
];

/// Target on the radiative forcing of the Kyoto gases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KyotoForcingTarget {
    /// unit: W / m^2
    pub target_value: FloatValue,
    /// First year in which the policy can change the outcome
    pub first_tax_year: Year,
}

impl KyotoForcingTarget {
    pub fn new(target_value: FloatValue, first_tax_year: Year) -> Self {
        Self {
            target_value,
            first_tax_year,
        }
    }

    /// Sum of the forcing of every Kyoto gas in `year`
    pub fn calc_kyoto_forcing(&self, climate: &dyn ClimateModel, year: Year) -> FloatValue {
        KYOTO_GASES
            .iter()
            .map(|gas| climate.forcing(gas, year))
            .sum()
    }

    /// Year and value of the largest forcing.
    ///
    /// Ties keep the earlier year. When no year has a positive forcing the year
    /// before the first tax year is returned.
    fn max_target_value(
        &self,
        climate: &dyn ClimateModel,
        modeltime: &dyn ModelTime,
    ) -> (Year, FloatValue) {
        let mut max_year = self.first_tax_year - 1;
        let mut max_forcing = 0.0;
        for year in self.first_tax_year..=modeltime.end_year() {
            let forcing = self.calc_kyoto_forcing(climate, year);
            if max_forcing < forcing {
                max_forcing = forcing;
                max_year = year;
            }
        }
        (max_year, max_forcing)
    }
}

#[typetag::serde]
impl Target for KyotoForcingTarget {
    fn get_status(
        &self,
        climate: &dyn ClimateModel,
        modeltime: &dyn ModelTime,
        year: TargetYear,
    ) -> RLAMResult<FloatValue> {
        let (year, known_forcing) = match year {
            TargetYear::Year(year) => (year, None),
            TargetYear::YearOfMaxValue => {
                let (year, forcing) = self.max_target_value(climate, modeltime);
                (year, Some(forcing))
            }
        };
        if year < self.first_tax_year {
            return Err(RLAMError::YearBeforeFirstTaxYear {
                year,
                first_tax_year: self.first_tax_year,
            });
        }

        let forcing = known_forcing.unwrap_or_else(|| self.calc_kyoto_forcing(climate, year));
        let percent_off = (forcing - self.target_value) / self.target_value * 100.0;
        info!(
            percent_off,
            current = forcing,
            target = self.target_value,
            year,
            "Distance from the forcing target"
        );
        Ok(percent_off)
    }

    fn year_of_max_target_value(
        &self,
        climate: &dyn ClimateModel,
        modeltime: &dyn ModelTime,
    ) -> Year {
        self.max_target_value(climate, modeltime).0
    }
}
