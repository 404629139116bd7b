#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod panel;
pub mod record;
pub mod security;
pub mod source;
pub mod store;

pub use error::{DataError, Result};
pub use panel::{Panel, PanelBounds, PanelKind, Snapshot};
pub use record::{
    BalanceSheet, CashFlowStatement, IncomeStatement, PanelRecord, PriceRecord, RevenueRecord,
    TimedRecord, ValuationRecord,
};
pub use security::{Security, SecurityCode};
pub use source::{CsvDirSource, FrameSource, MemorySource, PanelSource};
pub use store::{PanelStore, RefreshWindows, StatementPanels};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
