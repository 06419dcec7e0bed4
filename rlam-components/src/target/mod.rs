//! Policy targets evaluated against the output of a climate model.
//!
//! A target reports how far a simulated trajectory is from a policy goal as
//! a percent deviation. An external solver adjusts a policy lever (for
//! example a carbon tax) until the status is close enough to zero, see
//! [`bisect`].

mod kyoto_forcing;
mod search;

pub use kyoto_forcing::{KyotoForcingTarget, KYOTO_GASES};
pub use search::{bisect, BisectionOptions, TargetSolution};

use rlam_core::climate::ClimateModel;
use rlam_core::errors::RLAMResult;
use rlam_core::modeltime::ModelTime;
use rlam_core::timeseries::{FloatValue, Year};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Year in which a target is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetYear {
    Year(Year),
    /// The year in which the target's metric peaks
    YearOfMaxValue,
}

#[typetag::serde]
pub trait Target: Debug {
    /// Percent deviation of the metric from the target value.
    ///
    /// Positive values mean the metric overshoots the target.
    fn get_status(
        &self,
        climate: &dyn ClimateModel,
        modeltime: &dyn ModelTime,
        year: TargetYear,
    ) -> RLAMResult<FloatValue>;

    /// Year in which the metric is largest, searching from the first year the
    /// policy can act until the end of the scenario
    fn year_of_max_target_value(&self, climate: &dyn ClimateModel, modeltime: &dyn ModelTime)
        -> Year;
}
