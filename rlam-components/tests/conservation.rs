//! Conservation tests for the land allocator.
//!
//! These tests run a three level tree through every model period and verify:
//! - Land is conserved at every node
//! - Land-use-change emissions balance the change in carbon stocks

use approx::assert_relative_eq;
use rlam_components::land_allocator::{
    CarbonFlowLedger, CarbonParameters, ItemKind, LandAllocator, LandAllocatorInput,
    LandItemInput, LandLeafInput, LandNodeInput, LandType, LandUseHistory, LeafKind,
};
use rlam_core::info::Info;
use rlam_core::modeltime::{ModelTime, Modeltime};
use rlam_core::timeseries::{FloatValue, Year};

const REGION: &str = "Brazil";
const CARBON_START: Year = 1990;

fn modeltime() -> Modeltime {
    Modeltime::uniform(2000, 2020, 5).unwrap()
}

fn leaf(name: &str, kind: LeafKind, land_allocation: Vec<FloatValue>) -> LandLeafInput {
    LandLeafInput {
        name: name.to_string(),
        kind,
        land_allocation,
        observed_yield: vec![],
        above_ground_carbon: vec![10.0],
        below_ground_carbon: vec![60.0],
        carbon: CarbonParameters::default(),
        land_use_history: None,
    }
}

fn input() -> LandAllocatorInput {
    let forest = LandLeafInput {
        above_ground_carbon: vec![120.0],
        below_ground_carbon: vec![90.0],
        land_use_history: Some(
            LandUseHistory::new()
                .with_allocation(1990, 30.0)
                .with_allocation(1995, 28.0),
        ),
        ..leaf("Forest", LeafKind::Forest, vec![25.0, 24.0])
    };

    LandAllocatorInput {
        name: "root".to_string(),
        sigma: 0.3,
        land_allocation: vec![100.0],
        land_use_history: None,
        carbon_start_year: CARBON_START,
        children: vec![
            LandItemInput::Node(LandNodeInput {
                name: "AgroForestLand".to_string(),
                sigma: 0.5,
                unmanaged_land_value: 0.0,
                land_use_history: None,
                children: vec![
                    LandItemInput::Node(LandNodeInput {
                        name: "Cropland".to_string(),
                        sigma: 1.0,
                        unmanaged_land_value: 0.0,
                        land_use_history: None,
                        children: vec![
                            LandItemInput::Leaf(leaf("Corn", LeafKind::Crop, vec![20.0, 21.0])),
                            LandItemInput::Leaf(leaf("Wheat", LeafKind::Crop, vec![15.0, 16.0])),
                        ],
                    }),
                    LandItemInput::Leaf(forest),
                ],
            }),
            LandItemInput::Node(LandNodeInput {
                name: "UnmanagedLand".to_string(),
                sigma: 0.5,
                unmanaged_land_value: 1.0,
                land_use_history: None,
                children: vec![
                    LandItemInput::Leaf(leaf("Grassland", LeafKind::Unmanaged, vec![25.0])),
                    LandItemInput::Leaf(leaf("Shrubland", LeafKind::Unmanaged, vec![15.0])),
                ],
            }),
        ],
    }
}

/// Run every period with fixed profit rates for the managed leaves
fn solved_allocator() -> LandAllocator {
    let modeltime = modeltime();
    let mut allocator = LandAllocator::from_input(&input(), &modeltime).unwrap();
    allocator.complete_init(
        REGION,
        &Info::new(REGION).with_integer("rotationPeriod", 25),
        &modeltime,
    );

    let mut ledger = CarbonFlowLedger::new();
    for period in 0..allocator.periods() {
        allocator.set_intrinsic_rate("Cropland", "Corn", 2.0, period);
        allocator.set_intrinsic_rate("Cropland", "Wheat", 1.0, period);
        allocator.set_intrinsic_rate("Forest", "Forest", 1.5, period);

        allocator.init_calc(REGION, period);
        allocator
            .calc_final_land_allocation(REGION, period, &modeltime, &mut ledger)
            .unwrap();
    }
    allocator
}

fn total_stock(allocator: &LandAllocator, year: Year) -> FloatValue {
    allocator
        .leaves()
        .into_iter()
        .filter_map(|idx| allocator.item(idx).as_leaf())
        .map(|leaf| leaf.carbon().total_stock(year))
        .sum()
}

mod land_conservation {
    use super::*;

    /// Every node holds exactly the land of its children
    #[test]
    fn test_nodes_sum_their_children() {
        let allocator = solved_allocator();

        for period in 0..allocator.periods() {
            for idx in allocator.bfs(allocator.root()) {
                let children = allocator.children(idx);
                if children.is_empty() {
                    continue;
                }
                let total: FloatValue = children
                    .iter()
                    .map(|child| allocator.item(*child).land_allocation(period))
                    .sum();
                assert_relative_eq!(
                    total,
                    allocator.item(idx).land_allocation(period),
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_total_land_is_constant() {
        let allocator = solved_allocator();

        for period in 0..allocator.periods() {
            assert_eq!(allocator.item(allocator.root()).share(period), 1.0);
            assert_relative_eq!(
                allocator.total_land_allocation(LandType::Any, period),
                100.0,
                epsilon = 1e-9
            );
            assert_relative_eq!(
                allocator.total_land_allocation(LandType::Managed, period)
                    + allocator.total_land_allocation(LandType::Unmanaged, period),
                100.0,
                epsilon = 1e-9
            );
            for idx in allocator.leaves() {
                assert!(allocator.item(idx).land_allocation(period) >= 0.0);
            }
        }
    }

    /// With a sigma of one the cropland shares are proportional to the rates
    #[test]
    fn test_shares_follow_rates() {
        let allocator = solved_allocator();
        let corn = allocator.find_product("Cropland", "Corn").unwrap();
        let wheat = allocator.find_product("Cropland", "Wheat").unwrap();

        for period in 0..allocator.periods() {
            assert_relative_eq!(
                allocator.item(corn).share(period),
                2.0 / 3.0,
                epsilon = 1e-12
            );
            assert_relative_eq!(
                allocator.item(corn).land_allocation(period),
                2.0 * allocator.item(wheat).land_allocation(period),
                epsilon = 1e-9
            );
        }

        let cropland = allocator.find_child("Cropland", ItemKind::Node).unwrap();
        assert_eq!(allocator.parent(corn), Some(cropland));
    }
}

mod carbon_conservation {
    use super::*;

    /// Cumulative emissions equal the loss of carbon from all leaves
    #[test]
    fn test_emissions_balance_stocks() {
        let allocator = solved_allocator();
        let end_year = modeltime().end_year();

        let emitted: FloatValue = (CARBON_START..=end_year)
            .map(|year| allocator.luc_emissions(year).unwrap())
            .sum();
        let stock_change =
            total_stock(&allocator, CARBON_START) - total_stock(&allocator, end_year);

        assert_relative_eq!(emitted, stock_change, epsilon = 1e-6);
        assert_eq!(allocator.luc_emissions(CARBON_START), Some(0.0));
    }

    /// Years before the first period follow the land-use history
    #[test]
    fn test_history_sets_initial_stocks() {
        let allocator = solved_allocator();
        let forest = allocator.find_product("Forest", "Forest").unwrap();
        let carbon = allocator.item(forest).as_leaf().unwrap().carbon();

        assert_eq!(carbon.start_year(), CARBON_START);
        assert_relative_eq!(
            carbon.above_ground_stock(CARBON_START),
            30.0 * 120.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            carbon.below_ground_stock(CARBON_START),
            30.0 * 90.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_completed_years_are_marked() {
        let allocator = solved_allocator();

        for year in CARBON_START..=2015 {
            assert!(allocator.is_calculated(year), "year {year} not marked");
        }
        // The last time step is recalculated on every call
        assert!(!allocator.is_calculated(2016));
        assert!(!allocator.is_calculated(2020));
    }
}
