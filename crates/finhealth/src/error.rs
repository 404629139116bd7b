//! Error type of the pipeline.

use finhealth_data::DataError;
use finhealth_metrics::MetricsError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Panel refresh or access error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Derivation error
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A writer panicked while holding the shared pipeline
    #[error("Shared pipeline lock poisoned")]
    Poisoned,
}
