//! Scenario configuration read from TOML.
//!
//! ```toml
//! [modeltime]
//! years = [2000, 2005, 2010]
//!
//! [region]
//! name = "USA"
//! integers = { rotationPeriod = 30 }
//!
//! [land_allocator]
//! name = "root"
//! land_allocation = [100.0]
//! carbon_start_year = 1995
//!
//! [[land_allocator.children]]
//! type = "leaf"
//! name = "Grassland"
//! kind = "unmanaged"
//! land_allocation = [100.0]
//!
//! [[targets]]
//! [targets.KyotoForcingTarget]
//! target_value = 4.5
//! first_tax_year = 2020
//! ```

use rlam_components::land_allocator::{CarbonFlowLedger, LandAllocator, LandAllocatorInput};
use rlam_components::target::{BisectionOptions, Target};
use rlam_core::errors::{RLAMError, RLAMResult};
use rlam_core::info::Info;
use rlam_core::modeltime::{ModelTime, Modeltime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Everything needed to run the land allocator of one region
#[derive(Debug, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub modeltime: Modeltime,
    pub region: Info,
    pub land_allocator: LandAllocatorInput,
    #[serde(default)]
    pub targets: Vec<Box<dyn Target>>,
    #[serde(default)]
    pub bisection: BisectionOptions,
}

impl ScenarioConfig {
    pub fn from_toml_str(contents: &str) -> RLAMResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RLAMResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| RLAMError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build the described tree and calibrate it for every period
    pub fn build_land_allocator(&self) -> RLAMResult<LandAllocator> {
        let mut allocator = LandAllocator::from_input(&self.land_allocator, &self.modeltime)?;
        allocator.complete_init(self.region.name(), &self.region, &self.modeltime);
        info!(
            region = self.region.name(),
            leaves = allocator.leaves().len(),
            periods = allocator.periods(),
            "Built land allocator"
        );
        Ok(allocator)
    }

    /// Allocate land and solve land-use-change carbon for every period
    pub fn solve_land_allocator(&self, allocator: &mut LandAllocator) -> RLAMResult<()> {
        let region = self.region.name();
        let mut ledger = CarbonFlowLedger::new();
        for period in 0..self.modeltime.max_period() {
            allocator.init_calc(region, period);
            allocator.calc_final_land_allocation(region, period, &self.modeltime, &mut ledger)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use rlam_components::land_allocator::LandType;
    use rlam_components::target::TargetYear;
    use rlam_core::climate::ForcingTable;
    use rlam_core::info::RegionInfo;

    const SCENARIO: &str = r#"
[modeltime]
years = [2000, 2005, 2010]

[region]
name = "USA"
integers = { rotationPeriod = 30 }

[land_allocator]
name = "root"
land_allocation = [100.0]
carbon_start_year = 1995

[[land_allocator.children]]
type = "node"
name = "Cropland"
sigma = 0.5

[[land_allocator.children.children]]
type = "leaf"
name = "Corn"
land_allocation = [20.0, 22.0]
above_ground_carbon = [5.0]
below_ground_carbon = [80.0]

[[land_allocator.children.children]]
type = "leaf"
name = "Wheat"
land_allocation = [10.0, 12.0]
above_ground_carbon = [5.0]
below_ground_carbon = [80.0]
carbon = { mature_age = 20.0 }

[[land_allocator.children]]
type = "node"
name = "UnmanagedLand"
sigma = 0.5
unmanaged_land_value = 1.0

[[land_allocator.children.children]]
type = "leaf"
name = "Forest"
kind = "unmanaged"
land_allocation = [70.0]
above_ground_carbon = [150.0]
below_ground_carbon = [100.0]

[[targets]]
[targets.KyotoForcingTarget]
target_value = 4.0
first_tax_year = 2005

[bisection]
tolerance = 0.1
"#;

    #[test]
    fn read_scenario() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();

        assert_eq!(config.modeltime.max_period(), 3);
        assert_eq!(config.region.get_integer("rotationPeriod", true), 30);
        assert_eq!(config.land_allocator.children.len(), 2);
        assert_eq!(config.bisection.tolerance, 0.1);
        assert_eq!(config.bisection.max_iterations, 100);

        assert_eq!(config.targets.len(), 1);
        let climate = ForcingTable::new().with_forcing("CO2", 2010, 5.0);
        let status = config.targets[0]
            .get_status(&climate, &config.modeltime, TargetYear::YearOfMaxValue)
            .unwrap();
        assert!(is_close!(status, 25.0));
    }

    #[test]
    fn build_and_solve() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        let mut allocator = config.build_land_allocator().unwrap();
        assert_eq!(allocator.name(), "root");
        assert_eq!(allocator.leaves().len(), 3);

        config.solve_land_allocator(&mut allocator).unwrap();
        for period in 0..3 {
            assert!(is_close!(
                allocator.total_land_allocation(LandType::Any, period),
                100.0,
                abs_tol = 1e-9
            ));
        }
        assert!(is_close!(
            allocator.get_land_allocation("Cropland", "Corn", 1),
            22.0
        ));
        assert!(allocator.is_calculated(2005));
    }

    #[test]
    fn invalid_scenarios() {
        assert!(matches!(
            ScenarioConfig::from_toml_str("[modeltime]\nyears = []"),
            Err(RLAMError::Config(_))
        ));
        assert!(matches!(
            ScenarioConfig::from_path("does/not/exist.toml"),
            Err(RLAMError::Io { .. })
        ));
    }
}
