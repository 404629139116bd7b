//! Pipeline configuration.

use crate::error::Result;
use finhealth_data::RefreshWindows;
use finhealth_metrics::FeatureConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the pipeline
///
/// Every field has a default, so `{}` is a valid configuration:
///
/// ```json
/// {
///   "windows": { "price_days": 10, "reference_date": "2024-06-30" },
///   "features": { "margin_delta": "legacy", "min_eps_quarters": 2 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Refresh lookback per panel
    pub windows: RefreshWindows,
    /// Feature join options
    pub features: FeatureConfig,
}

impl PipelineConfig {
    /// Parse a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.features.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::NaiveDate;
    use finhealth_metrics::MarginDeltaMode;
    use rstest::rstest;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(PipelineConfig::from_json("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = PipelineConfig::from_json(
            r#"{
                "windows": { "price_days": 30, "reference_date": "2024-06-30" },
                "features": { "margin_delta": "legacy" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.windows.price_days, 30);
        assert_eq!(config.windows.valuation_days, 10);
        assert_eq!(
            config.windows.reference_date,
            NaiveDate::from_ymd_opt(2024, 6, 30)
        );
        assert_eq!(config.features.margin_delta, MarginDeltaMode::Legacy);
        assert_eq!(config.features.min_eps_quarters, 1);
    }

    #[rstest]
    #[case(r#"{ "features": { "min_eps_quarters": 0 } }"#, true)]
    #[case(r#"{ "features": { "min_eps_quarters": 5 } }"#, true)]
    #[case(r#"{ "features": { "margin_delta": "sideways" } }"#, false)]
    #[case(r#"{ "windows": { "reference_date": "2024-13-01" } }"#, false)]
    fn test_invalid_config(#[case] text: &str, #[case] rejected_by_validation: bool) {
        match PipelineConfig::from_json(text) {
            Err(Error::Metrics(_)) => assert!(rejected_by_validation),
            Err(Error::Config(_)) => assert!(!rejected_by_validation),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig::default();
        let text = config.to_json().unwrap();
        assert_eq!(PipelineConfig::from_json(&text).unwrap(), config);
    }
}
