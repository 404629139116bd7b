//! Error types for metric derivation.

use finhealth_data::DataError;
use thiserror::Error;

/// Result type for metric derivation.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors that can occur during metric derivation.
///
/// Ratio arithmetic never fails; undefined ratios are NaN.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Quarter number outside 1..=4 or unparsable quarter label
    #[error("Invalid fiscal quarter: {0}")]
    InvalidQuarter(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Panel access error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
