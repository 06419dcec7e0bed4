//! Land allocation and policy target components.
//!
//! - [`land_allocator`]: nested logit allocation of a region's land with
//!   land-use-change carbon accounting
//! - [`target`]: policy targets evaluated against climate model output

pub mod land_allocator;
pub mod target;
