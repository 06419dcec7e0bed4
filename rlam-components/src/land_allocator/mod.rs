//! Nested logit land allocation with land-use-change carbon accounting.
//!
//! The land of a region is divided over a tree of land types. Each node splits
//! its land among its children using logit shares of their intrinsic rates,
//! where the node's sigma controls how readily land moves between children.
//! A sigma of zero keeps the calibrated shares.
//!
//! A model run calls the allocator once per period:
//!
//! 1. [`LandAllocator::init_calc`] resets the period to its calibration data,
//! 2. [`LandAllocator::calc_final_land_allocation`] computes shares top-down,
//!    converts them into land areas and then solves the carbon flows of every
//!    year that is due.
//!
//! Carbon is solved year by year in three phases (flows out, flows in and the
//! box model) which each visit every leaf before the next phase starts. The
//! totals of a year are collected in a [`CarbonFlowLedger`] owned by the run.

mod carbon;
mod description;
mod history;
mod item;
mod ledger;
mod shares;
mod tree;

#[cfg(test)]
mod tests;

pub use carbon::{CarbonParameters, LandCarbon};
pub use description::{ItemDebug, LandAllocatorInput, LandItemInput, LandLeafInput, LandNodeInput};
pub use history::LandUseHistory;
pub use item::{
    InheritedHistory, ItemKind, ItemRole, LandItem, LandLeaf, LandNode, LandType, LandUsageType,
    LeafKind,
};
pub use ledger::CarbonFlowLedger;
pub use shares::{logit_shares, normalize_shares};
pub use tree::{LandAllocator, TotalLandAdjustment};

use rlam_core::timeseries::FloatValue;

/// Tolerance used for sigma and land comparisons
pub const SMALL_NUMBER: FloatValue = 1e-6;

/// Relative change of unmanaged land between calibration and read-in values
/// above which a warning is logged
pub const UNMANAGED_LAND_CHANGE_TOLERANCE: FloatValue = 0.01;

/// Factor applied to the managed land to obtain the total land when
/// calibrated managed land exceeds the declared total
pub const TOTAL_LAND_INFLATION: FloatValue = 1.2;
