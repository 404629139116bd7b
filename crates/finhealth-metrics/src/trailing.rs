//! Trailing four-quarter profit profile.

use crate::{
    calendar::FiscalQuarter,
    features::{FeatureRow, GrowthDeltas, QuarterOffset},
    profitability::ProfitMetric,
};
use finhealth_data::{Security, SecurityCode, ValuationRecord};
use serde::{Deserialize, Serialize};

/// Four-quarter sums over offsets 0..=3 next to the valuation and deltas of a
/// feature row.
///
/// A sum skips absent quarters and is NaN only when all four are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingProfile {
    /// Security code
    pub code: SecurityCode,
    /// Latest quarter of the window
    pub quarter: FiscalQuarter,
    /// Security attributes, when composed
    pub security: Option<Security>,
    /// Latest valuation multiples
    pub valuation: ValuationRecord,
    /// Total basic EPS
    pub eps_total: f64,
    /// Summed gross margin %
    pub gross_margin_pct: f64,
    /// Summed net margin %
    pub net_margin_pct: f64,
    /// Summed ROA %
    pub roa_pct: f64,
    /// Summed ROE %
    pub roe_pct: f64,
    /// Deltas carried from the feature row
    pub deltas: GrowthDeltas,
}

fn trailing_sum(row: &FeatureRow, metric: ProfitMetric) -> f64 {
    QuarterOffset::all()
        .take(4)
        .map(|offset| row.metric(offset, metric))
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v))
        .unwrap_or(f64::NAN)
}

impl From<&FeatureRow> for TrailingProfile {
    fn from(row: &FeatureRow) -> Self {
        Self {
            code: row.code.clone(),
            quarter: row.quarter,
            security: row.security.clone(),
            valuation: row.valuation.clone(),
            eps_total: trailing_sum(row, ProfitMetric::BasicEps),
            gross_margin_pct: trailing_sum(row, ProfitMetric::GrossMarginPct),
            net_margin_pct: trailing_sum(row, ProfitMetric::NetMarginPct),
            roa_pct: trailing_sum(row, ProfitMetric::RoaPct),
            roe_pct: trailing_sum(row, ProfitMetric::RoePct),
            deltas: row.deltas,
        }
    }
}

/// Trailing profiles for a set of feature rows, in the same order.
pub fn trailing_profiles(rows: &[FeatureRow]) -> Vec<TrailingProfile> {
    rows.iter().map(TrailingProfile::from).collect()
}
