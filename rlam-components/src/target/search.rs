use rlam_core::errors::{RLAMError, RLAMResult};
use rlam_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Controls for solving a target by bisection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BisectionOptions {
    /// Largest absolute status accepted as solved
    /// unit: percent
    /// default: 0.01
    pub tolerance: FloatValue,
    /// default: 100
    pub max_iterations: usize,
}

impl Default for BisectionOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSolution {
    /// Value of the policy lever meeting the target
    pub lever: FloatValue,
    pub status: FloatValue,
    /// Number of bisection steps taken
    pub iterations: usize,
}

/// Find the lever value for which `status` is within tolerance of zero.
///
/// `status` is typically a closure that runs the model with the given lever
/// and returns [`super::Target::get_status`]. The statuses at `lower` and `upper`
/// must have opposite signs.
pub fn bisect<F>(
    mut status: F,
    lower: FloatValue,
    upper: FloatValue,
    options: &BisectionOptions,
) -> RLAMResult<TargetSolution>
where
    F: FnMut(FloatValue) -> RLAMResult<FloatValue>,
{
    let solved = |status: FloatValue| status.abs() <= options.tolerance;

    let mut lower = lower;
    let mut upper = upper;
    let lower_status = status(lower)?;
    if solved(lower_status) {
        return Ok(TargetSolution {
            lever: lower,
            status: lower_status,
            iterations: 0,
        });
    }
    let upper_status = status(upper)?;
    if solved(upper_status) {
        return Ok(TargetSolution {
            lever: upper,
            status: upper_status,
            iterations: 0,
        });
    }
    if lower_status.signum() == upper_status.signum() {
        return Err(RLAMError::TargetNotBracketed {
            lower,
            upper,
            lower_status,
            upper_status,
        });
    }

    let mut last_status = lower_status;
    for iteration in 1..=options.max_iterations {
        let lever = 0.5 * (lower + upper);
        let current = status(lever)?;
        debug!(iteration, lever, status = current, "Bisection step");
        if solved(current) {
            return Ok(TargetSolution {
                lever,
                status: current,
                iterations: iteration,
            });
        }
        if current.signum() == lower_status.signum() {
            lower = lever;
        } else {
            upper = lever;
        }
        last_status = current;
    }

    Err(RLAMError::TargetNotFound {
        iterations: options.max_iterations,
        status: last_status,
    })
}
