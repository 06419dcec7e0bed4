use crate::timeseries::Year;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum RLAMError {
    #[error("{0}")]
    Error(String),
    #[error("Invalid type of Curve requested: {0}")]
    UnknownCurveType(String),
    #[error("Sampling step must be positive, got {0}")]
    NonPositiveStep(f64),
    #[error("Year {year} precedes the first tax year {first_tax_year}. The target cannot be changed in that year")]
    YearBeforeFirstTaxYear { year: Year, first_tax_year: Year },
    #[error("Carbon flow ledger was reset for year {expected:?} but read for year {found}")]
    LedgerYearMismatch { expected: Option<Year>, found: Year },
    #[error("Invalid model time: {0}")]
    InvalidModelTime(String),
    #[error("Invalid land allocator description: {0}")]
    InvalidDescription(String),
    #[error("Target is not bracketed between {lower} (status {lower_status}) and {upper} (status {upper_status})")]
    TargetNotBracketed {
        lower: f64,
        upper: f64,
        lower_status: f64,
        upper_status: f64,
    },
    #[error("Target search did not converge after {iterations} iterations. Last status was {status}")]
    TargetNotFound { iterations: usize, status: f64 },
    #[error("Could not parse configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type for `Result<T, RLAMError>`.
pub type RLAMResult<T> = Result<T, RLAMError>;
