//! Mapping between model periods and calendar years.
//!
//! The land allocator never assumes a uniform time step. All lookups go through
//! the [`ModelTime`] trait so a scenario can inject its own period layout.

use crate::errors::{RLAMError, RLAMResult};
use crate::timeseries::{Period, Year};
use serde::{Deserialize, Serialize};

/// Period/year lookups required by the land allocator and the target finder
pub trait ModelTime {
    /// Calendar year at the end of `period`
    fn period_to_year(&self, period: Period) -> Year;

    /// Period whose time step contains `year`.
    ///
    /// Years before the first model year map to period 0 and years after the
    /// last model year map to the final period.
    fn year_to_period(&self, year: Year) -> Period;

    /// Number of years covered by `period`
    fn timestep(&self, period: Period) -> i32;

    /// Number of model periods
    fn max_period(&self) -> usize;

    fn start_year(&self) -> Year {
        self.period_to_year(0)
    }

    /// Last year of the scenario
    fn end_year(&self) -> Year {
        self.period_to_year(self.max_period() - 1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModeltimeDescription {
    years: Vec<Year>,
    #[serde(default)]
    first_timestep: Option<i32>,
}

/// Model time built from an explicit list of period years.
///
/// ```rust
/// use rlam_core::modeltime::{ModelTime, Modeltime};
///
/// let modeltime = Modeltime::uniform(1990, 2020, 15).unwrap();
/// assert_eq!(modeltime.max_period(), 3);
/// assert_eq!(modeltime.year_to_period(1991), 1);
/// assert_eq!(modeltime.end_year(), 2020);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModeltimeDescription", into = "ModeltimeDescription")]
pub struct Modeltime {
    years: Vec<Year>,
    first_timestep: i32,
}

impl Modeltime {
    /// Build from strictly increasing period years.
    ///
    /// The first period's time step defaults to the step between the first two
    /// periods, or one year for a single period model.
    pub fn from_years(years: Vec<Year>) -> RLAMResult<Self> {
        Self::build(years, None)
    }

    /// Periods from `start_year` to `end_year` (inclusive) every `timestep` years
    pub fn uniform(start_year: Year, end_year: Year, timestep: i32) -> RLAMResult<Self> {
        if timestep <= 0 {
            return Err(RLAMError::InvalidModelTime(format!(
                "time step must be positive, got {}",
                timestep
            )));
        }
        let years = (start_year..=end_year).step_by(timestep as usize).collect();
        Self::build(years, Some(timestep))
    }

    /// Override the length of the first period
    pub fn with_first_timestep(self, first_timestep: i32) -> RLAMResult<Self> {
        Self::build(self.years, Some(first_timestep))
    }

    fn build(years: Vec<Year>, first_timestep: Option<i32>) -> RLAMResult<Self> {
        if years.is_empty() {
            return Err(RLAMError::InvalidModelTime(
                "at least one period is required".to_string(),
            ));
        }
        if years.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RLAMError::InvalidModelTime(format!(
                "period years must be strictly increasing: {:?}",
                years
            )));
        }
        let first_timestep = match first_timestep {
            Some(step) if step <= 0 => {
                return Err(RLAMError::InvalidModelTime(format!(
                    "first time step must be positive, got {}",
                    step
                )))
            }
            Some(step) => step,
            None if years.len() > 1 => years[1] - years[0],
            None => 1,
        };
        Ok(Self {
            years,
            first_timestep,
        })
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }
}

impl TryFrom<ModeltimeDescription> for Modeltime {
    type Error = RLAMError;

    fn try_from(value: ModeltimeDescription) -> Result<Self, Self::Error> {
        Self::build(value.years, value.first_timestep)
    }
}

impl From<Modeltime> for ModeltimeDescription {
    fn from(value: Modeltime) -> Self {
        ModeltimeDescription {
            years: value.years,
            first_timestep: Some(value.first_timestep),
        }
    }
}

impl ModelTime for Modeltime {
    fn period_to_year(&self, period: Period) -> Year {
        self.years[period]
    }

    fn year_to_period(&self, year: Year) -> Period {
        self.years
            .iter()
            .position(|y| *y >= year)
            .unwrap_or(self.years.len() - 1)
    }

    fn timestep(&self, period: Period) -> i32 {
        match period {
            0 => self.first_timestep,
            p => self.years[p] - self.years[p - 1],
        }
    }

    fn max_period(&self) -> usize {
        self.years.len()
    }
}
