#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export main types from sub-crates
pub use finhealth_data as data;
pub use finhealth_metrics as metrics;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::{Derived, Pipeline, SharedPipeline};

// Re-export the types most callers touch
pub use finhealth_data::{CsvDirSource, FrameSource, MemorySource, PanelSource, PanelStore};
pub use finhealth_metrics::{FeatureConfig, FeatureRow, FiscalQuarter, MarginDeltaMode};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
