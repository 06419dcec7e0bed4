//! Core types shared by the land allocation model.
//!
//! - [`timeseries`]: period and year indexed vectors
//! - [`modeltime`]: mapping between model periods and calendar years
//! - [`info`]: string keyed region configuration
//! - [`climate`]: the forcing interface consumed from a climate model
//! - [`curve`]: `(x, y)` curves used for trajectory comparisons

pub mod climate;
pub mod curve;
pub mod errors;
pub mod info;
pub mod modeltime;
pub mod timeseries;
