#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calendar;
pub mod columns;
pub mod compose;
pub mod error;
pub mod features;
pub mod frame;
pub mod profitability;
pub mod ratio;
pub mod revenue;
pub mod trailing;

pub use calendar::{FiscalQuarter, QuarterCursor};
pub use compose::compose;
pub use error::{MetricsError, Result};
pub use features::{
    EpsSummary, FeatureBuilder, FeatureConfig, FeatureRow, GrowthDeltas, MarginDeltaMode,
    QuarterOffset, build_features,
};
pub use frame::{features_to_frame, profitability_to_frame};
pub use profitability::{
    ProfitMetric, ProfitabilityRecord, ProfitabilityTable, derive_from_store,
    derive_profitability, profitability_frame,
};
pub use revenue::{RevenueAggregate, RevenueBuckets, aggregate_revenue, aggregate_revenue_frame};
pub use trailing::{TrailingProfile, trailing_profiles};

// Re-export catalog types for convenience
pub use columns::{
    Cell, ColumnGroup, ColumnInfo, ColumnValue, available_columns, column_info,
    columns_by_group, default_feature_columns,
};
