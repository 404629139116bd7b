//! Error types for panel operations.

use crate::panel::PanelKind;
use thiserror::Error;

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or reading panels.
#[derive(Debug, Error)]
pub enum DataError {
    /// A derivation needed a panel that was never refreshed
    #[error("Panel {0} has not been refreshed")]
    MissingPanel(PanelKind),

    /// A latest snapshot was requested from a panel without records
    #[error("Panel {0} contains no records")]
    EmptyPanel(PanelKind),

    /// A column required by the panel's column contract is absent
    #[error("Missing column '{column}' in {panel} panel")]
    MissingColumn {
        /// Panel being loaded
        panel: PanelKind,
        /// Name of the absent column
        column: String,
    },

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Acquisition layer failure
    #[error("Source error: {0}")]
    Source(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
