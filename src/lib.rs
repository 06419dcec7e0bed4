//! Nested land allocation with land-use-change carbon accounting and policy
//! target search.
//!
//! The model is split over two crates which are re-exported here:
//!
//! - [`core`]: errors, time axes, the collaborator traits and curves
//! - [`components`]: the land allocator and the policy targets
//!
//! [`config::ScenarioConfig`] reads a scenario from TOML and builds the pieces
//! of a run from it.

pub use rlam_components as components;
pub use rlam_core as core;

pub mod config;
