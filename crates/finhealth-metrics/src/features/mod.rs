//! Multi-quarter feature join.
//!
//! Starting from the latest valuation snapshot (one row per security), the
//! profitability table is left-joined at the latest quarter and the four
//! quarters before it, each offset's columns suffixed `_q1`..`_q4`. A security with no profitability at some offset keeps
//! its row with that offset absent.
//!
//! Per row:
//! - `E(k)` basic EPS and `外(k)` non-operating income at offsets 0..=4
//! - `E(Sum)`, `E(Avg)`, `E(Std)` over `E(0)..E(3)`
//! - `外%(k)` non-operating income over net income at offsets 0..=3
//! - custom EPS = net income / common-stock capital × 10, custom P/E =
//!   close / (custom EPS × 4)
//! - current-minus-previous deltas of the ratios and balance sheet totals

mod offset;
mod row;

pub use offset::QuarterOffset;
pub use row::{EpsSummary, FeatureRow, GrowthDeltas};

use crate::{
    calendar::{FiscalQuarter, QuarterCursor},
    error::{MetricsError, Result},
    frame::{CODE, QUARTER, codes},
    profitability::{ProfitMetric, ProfitabilityTable, read_records},
    ratio::{div, moments, pct},
};
use finhealth_data::{PanelStore, PriceRecord, SecurityCode, Snapshot, ValuationRecord};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// How margin deltas are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginDeltaMode {
    /// Current quarter minus previous quarter
    #[default]
    Corrected,
    /// Previous quarter minus itself: 0, or NaN when the previous quarter is
    /// missing. Only the gross and net margin deltas are affected.
    Legacy,
}

/// Configuration for the feature join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Margin delta computation (default: corrected)
    pub margin_delta: MarginDeltaMode,
    /// Quarters of EPS required for the EPS aggregates, 1..=4 (default: 1)
    pub min_eps_quarters: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            margin_delta: MarginDeltaMode::Corrected,
            min_eps_quarters: 1,
        }
    }
}

impl FeatureConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(1..=4).contains(&self.min_eps_quarters) {
            return Err(MetricsError::InvalidConfig(format!(
                "min_eps_quarters must be between 1 and 4, got {}",
                self.min_eps_quarters
            )));
        }
        Ok(())
    }
}

/// Builds [`FeatureRow`]s from snapshots and a profitability table.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    /// Create a builder with a validated configuration.
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// One row per security in `valuations`, keyed to `quarter` as offset 0.
    pub fn build(
        &self,
        valuations: &Snapshot<ValuationRecord>,
        profitability: &ProfitabilityTable,
        prices: &Snapshot<PriceRecord>,
        quarter: FiscalQuarter,
    ) -> Result<Vec<FeatureRow>> {
        let mut offsets = [quarter; QuarterOffset::COUNT];
        let mut cursor = QuarterCursor::new(quarter);
        for slot in offsets.iter_mut().skip(1) {
            *slot = cursor.step_back();
        }

        let history = profitability.to_lazy()?;
        let securities: Vec<&str> = valuations.rows.keys().map(SecurityCode::as_str).collect();
        let mut joined = DataFrame::new(vec![Column::new(CODE.into(), securities)])?.lazy();
        for (offset, q) in QuarterOffset::all().zip(offsets) {
            joined = joined.join(
                offset_frame(history.clone(), q, offset),
                [col(CODE)],
                [col(CODE)],
                JoinArgs::new(JoinType::Left),
            );
        }
        let df = joined.sort([CODE], Default::default()).collect()?;

        let mut per_offset = QuarterOffset::all()
            .map(|offset| read_records(&df, &offset.suffix()).map(Vec::into_iter))
            .collect::<Result<Vec<_>>>()?;
        let rows: Vec<FeatureRow> = codes(&df)?
            .into_iter()
            .filter_map(|code| {
                let quarters = std::array::from_fn(|i| per_offset[i].next().flatten());
                let valuation = valuations.rows.get(&code)?.clone();
                let mut row = FeatureRow {
                    price: prices.get(&code).cloned(),
                    code,
                    quarter,
                    security: None,
                    valuation,
                    quarters,
                    eps: EpsSummary {
                        sum: f64::NAN,
                        mean: f64::NAN,
                        std: f64::NAN,
                        quarters: 0,
                    },
                    non_operating_pct: [f64::NAN; 4],
                    custom_eps: f64::NAN,
                    custom_pe: f64::NAN,
                    deltas: GrowthDeltas {
                        gross_margin_pct: f64::NAN,
                        net_margin_pct: f64::NAN,
                        roa_pct: f64::NAN,
                        roe_pct: f64::NAN,
                        leverage_pct: f64::NAN,
                        common_stock_capital: f64::NAN,
                        total_assets: f64::NAN,
                        total_equity: f64::NAN,
                    },
                };
                self.derive(&mut row);
                Some(row)
            })
            .collect();

        let joined = rows
            .iter()
            .filter(|row| row.at(QuarterOffset::CURRENT).is_some())
            .count();
        tracing::debug!(
            %quarter,
            rows = rows.len(),
            with_current_quarter = joined,
            "built feature rows"
        );
        Ok(rows)
    }

    /// Build from the store's latest valuations and prices, with the quarter
    /// reported by the latest statement as offset 0.
    pub fn build_from_store(
        &self,
        store: &PanelStore,
        profitability: &ProfitabilityTable,
    ) -> Result<Vec<FeatureRow>> {
        let quarter = FiscalQuarter::reported_by(store.latest_statement_date()?);
        self.build(
            &store.latest_valuations()?,
            profitability,
            &store.latest_prices()?,
            quarter,
        )
    }

    fn derive(&self, row: &mut FeatureRow) {
        let eps: Vec<f64> = QuarterOffset::all()
            .take(4)
            .map(|offset| row.eps(offset))
            .collect();
        row.eps = moments(&eps, self.config.min_eps_quarters).into();

        let mut non_operating_pct = [f64::NAN; 4];
        for (offset, slot) in QuarterOffset::all().zip(non_operating_pct.iter_mut()) {
            *slot = pct(
                row.non_operating(offset),
                row.metric(offset, ProfitMetric::NetIncome),
            );
        }
        row.non_operating_pct = non_operating_pct;

        let current = QuarterOffset::CURRENT;
        row.custom_eps = div(
            row.metric(current, ProfitMetric::NetIncome),
            row.metric(current, ProfitMetric::CommonStockCapital),
        ) * 10.0;
        row.custom_pe = div(row.close(), row.custom_eps * 4.0);

        let delta = |metric: ProfitMetric| {
            row.metric(current, metric) - row.metric(QuarterOffset::PREVIOUS, metric)
        };
        let margin_delta = |metric: ProfitMetric| match self.config.margin_delta {
            MarginDeltaMode::Corrected => delta(metric),
            MarginDeltaMode::Legacy => {
                let previous = row.metric(QuarterOffset::PREVIOUS, metric);
                previous - previous
            }
        };
        let deltas = GrowthDeltas {
            gross_margin_pct: margin_delta(ProfitMetric::GrossMarginPct),
            net_margin_pct: margin_delta(ProfitMetric::NetMarginPct),
            roa_pct: delta(ProfitMetric::RoaPct),
            roe_pct: delta(ProfitMetric::RoePct),
            leverage_pct: delta(ProfitMetric::LeveragePct),
            common_stock_capital: delta(ProfitMetric::CommonStockCapital),
            total_assets: delta(ProfitMetric::TotalAssets),
            total_equity: delta(ProfitMetric::TotalEquity),
        };
        row.deltas = deltas;
    }
}

// Profitability at one quarter, with `quarter` and metric columns suffixed
// for `offset`.
fn offset_frame(history: LazyFrame, quarter: FiscalQuarter, offset: QuarterOffset) -> LazyFrame {
    let suffix = offset.suffix();
    let mut selection = vec![col(CODE), col(QUARTER).alias(format!("{QUARTER}{suffix}"))];
    selection.extend(
        ProfitMetric::ALL
            .iter()
            .map(|m| col(m.name()).alias(format!("{}{suffix}", m.name()))),
    );
    history
        .filter(col(QUARTER).eq(lit(quarter.key())))
        .select(selection)
}

/// Build feature rows with the default configuration.
pub fn build_features(
    valuations: &Snapshot<ValuationRecord>,
    profitability: &ProfitabilityTable,
    prices: &Snapshot<PriceRecord>,
    quarter: FiscalQuarter,
) -> Result<Vec<FeatureRow>> {
    FeatureBuilder::default().build(valuations, profitability, prices, quarter)
}
