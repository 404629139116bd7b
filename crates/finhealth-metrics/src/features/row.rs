//! Feature row: one security's multi-quarter view.

use super::offset::QuarterOffset;
use crate::{
    calendar::FiscalQuarter,
    profitability::{ProfitMetric, ProfitabilityRecord},
    ratio::Moments,
};
use finhealth_data::{PriceRecord, Security, SecurityCode, ValuationRecord};
use serde::{Deserialize, Serialize};

/// Sum, mean and population standard deviation of basic EPS over offsets
/// 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsSummary {
    /// `E(Sum)`
    pub sum: f64,
    /// `E(Avg)`
    pub mean: f64,
    /// `E(Std)`
    pub std: f64,
    /// Quarters that contributed
    pub quarters: usize,
}

impl From<Moments> for EpsSummary {
    fn from(m: Moments) -> Self {
        Self {
            sum: m.sum,
            mean: m.mean,
            std: m.std,
            quarters: m.count,
        }
    }
}

/// Changes from the previous quarter to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthDeltas {
    /// Gross margin % change
    pub gross_margin_pct: f64,
    /// Net margin % change
    pub net_margin_pct: f64,
    /// ROA % change
    pub roa_pct: f64,
    /// ROE % change
    pub roe_pct: f64,
    /// Leverage % change
    pub leverage_pct: f64,
    /// Common-stock capital change
    pub common_stock_capital: f64,
    /// Total assets change
    pub total_assets: f64,
    /// Total equity change
    pub total_equity: f64,
}

impl GrowthDeltas {
    /// Metrics carried as deltas, in export order.
    pub const METRICS: [ProfitMetric; 8] = [
        ProfitMetric::GrossMarginPct,
        ProfitMetric::NetMarginPct,
        ProfitMetric::RoaPct,
        ProfitMetric::RoePct,
        ProfitMetric::LeveragePct,
        ProfitMetric::CommonStockCapital,
        ProfitMetric::TotalAssets,
        ProfitMetric::TotalEquity,
    ];

    /// Delta of a metric; NaN for metrics not carried.
    pub fn get(&self, metric: ProfitMetric) -> f64 {
        match metric {
            ProfitMetric::GrossMarginPct => self.gross_margin_pct,
            ProfitMetric::NetMarginPct => self.net_margin_pct,
            ProfitMetric::RoaPct => self.roa_pct,
            ProfitMetric::RoePct => self.roe_pct,
            ProfitMetric::LeveragePct => self.leverage_pct,
            ProfitMetric::CommonStockCapital => self.common_stock_capital,
            ProfitMetric::TotalAssets => self.total_assets,
            ProfitMetric::TotalEquity => self.total_equity,
            _ => f64::NAN,
        }
    }
}

/// Multi-quarter features of one security.
///
/// Built from the latest valuation snapshot; profitability at each
/// [`QuarterOffset`] is absent when the security had no row for that quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Security code
    pub code: SecurityCode,
    /// Latest reported quarter (offset 0)
    pub quarter: FiscalQuarter,
    /// Security attributes, attached by composition
    pub security: Option<Security>,
    /// Latest price
    pub price: Option<PriceRecord>,
    /// Latest valuation multiples
    pub valuation: ValuationRecord,
    /// Profitability by offset
    pub quarters: [Option<ProfitabilityRecord>; QuarterOffset::COUNT],
    /// EPS aggregates
    pub eps: EpsSummary,
    /// Non-operating income over net income %, offsets 0..=3
    pub non_operating_pct: [f64; 4],
    /// Net income over common-stock capital × 10
    pub custom_eps: f64,
    /// Close over annualized custom EPS
    pub custom_pe: f64,
    /// Current minus previous quarter
    pub deltas: GrowthDeltas,
}

impl FeatureRow {
    /// Profitability at an offset.
    pub fn at(&self, offset: QuarterOffset) -> Option<&ProfitabilityRecord> {
        self.quarters[offset.index()].as_ref()
    }

    /// Metric at an offset, NaN when the quarter is absent.
    pub fn metric(&self, offset: QuarterOffset, metric: ProfitMetric) -> f64 {
        self.at(offset).map_or(f64::NAN, |row| row.get(metric))
    }

    /// `E(k)`: basic EPS at an offset.
    pub fn eps(&self, offset: QuarterOffset) -> f64 {
        self.metric(offset, ProfitMetric::BasicEps)
    }

    /// `外(k)`: non-operating income at an offset.
    pub fn non_operating(&self, offset: QuarterOffset) -> f64 {
        self.metric(offset, ProfitMetric::NonOperatingIncome)
    }

    /// `外%(k)` for offsets 0..=3; NaN beyond.
    pub fn non_operating_pct(&self, offset: QuarterOffset) -> f64 {
        self.non_operating_pct
            .get(offset.index())
            .copied()
            .unwrap_or(f64::NAN)
    }

    /// Latest close, NaN when no price is attached.
    pub fn close(&self) -> f64 {
        self.price
            .as_ref()
            .and_then(|p| p.close)
            .unwrap_or(f64::NAN)
    }
}
