//! Profitability derivation.
//!
//! Joins quarterly income statements, balance sheets and quarter-bucketed
//! revenue on `(quarter, security)` and derives five ratios:
//!
//! | Ratio          | Formula                                       |
//! |----------------|-----------------------------------------------|
//! | gross margin % | gross profit / operating revenue × 100        |
//! | net margin %   | net income / operating revenue × 100          |
//! | ROA %          | net income / total assets × 100               |
//! | ROE %          | net income / total equity × 100               |
//! | leverage %     | (total assets − total equity) / total assets × 100 |
//!
//! Margins divide by the statement's operating revenue. The aggregated
//! monthly revenue is carried alongside as supplementary columns only.
//!
//! The join and the ratios run as one lazy query; a ratio whose denominator
//! is zero, missing or (for assets) negative is null in the frame and NaN in
//! the typed [`ProfitabilityRecord`].

use crate::{
    calendar::FiscalQuarter,
    error::Result,
    frame::{CODE, QUARTER, codes, finite, metric_columns, numbers, quarters},
    revenue::{RevenueAggregate, aggregate_revenue_frame},
};
use finhealth_data::{BalanceSheet, IncomeStatement, Panel, PanelStore, SecurityCode};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type Field<T> = (ProfitMetric, fn(&T) -> Option<f64>);

const INCOME_FIELDS: [Field<IncomeStatement>; 5] = [
    (ProfitMetric::BasicEps, |s| s.basic_eps),
    (ProfitMetric::NonOperatingIncome, |s| s.non_operating_income),
    (ProfitMetric::GrossProfit, |s| s.gross_profit),
    (ProfitMetric::NetIncome, |s| s.net_income),
    (ProfitMetric::OperatingRevenue, |s| s.operating_revenue),
];

const BALANCE_FIELDS: [Field<BalanceSheet>; 3] = [
    (ProfitMetric::CommonStockCapital, |s| s.common_stock_capital),
    (ProfitMetric::TotalAssets, |s| s.total_assets),
    (ProfitMetric::TotalEquity, |s| s.total_equity),
];

/// Numeric fields of a [`ProfitabilityRecord`], addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfitMetric {
    /// Basic EPS
    BasicEps,
    /// Non-operating income and expenses
    NonOperatingIncome,
    /// Gross profit
    GrossProfit,
    /// Net income
    NetIncome,
    /// Total operating revenue from the income statement
    OperatingRevenue,
    /// Common-stock capital
    CommonStockCapital,
    /// Total assets
    TotalAssets,
    /// Total equity
    TotalEquity,
    /// Sum of monthly revenue in the quarter
    RevenueSum,
    /// Average monthly revenue in the quarter
    RevenueAverage,
    /// Months of revenue reported in the quarter
    RevenueMonths,
    /// Gross margin %
    GrossMarginPct,
    /// Net margin %
    NetMarginPct,
    /// Return on assets %
    RoaPct,
    /// Return on equity %
    RoePct,
    /// Liabilities over assets %
    LeveragePct,
}

impl ProfitMetric {
    /// Every metric, in column order.
    pub const ALL: [Self; 16] = [
        Self::BasicEps,
        Self::NonOperatingIncome,
        Self::GrossProfit,
        Self::NetIncome,
        Self::OperatingRevenue,
        Self::CommonStockCapital,
        Self::TotalAssets,
        Self::TotalEquity,
        Self::RevenueSum,
        Self::RevenueAverage,
        Self::RevenueMonths,
        Self::GrossMarginPct,
        Self::NetMarginPct,
        Self::RoaPct,
        Self::RoePct,
        Self::LeveragePct,
    ];

    /// The five derived ratios.
    pub const RATIOS: [Self; 5] = [
        Self::GrossMarginPct,
        Self::NetMarginPct,
        Self::RoaPct,
        Self::RoePct,
        Self::LeveragePct,
    ];

    /// Position in [`Self::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column name used in exports.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BasicEps => "basic_eps",
            Self::NonOperatingIncome => "non_operating_income",
            Self::GrossProfit => "gross_profit",
            Self::NetIncome => "net_income",
            Self::OperatingRevenue => "operating_revenue",
            Self::CommonStockCapital => "common_stock_capital",
            Self::TotalAssets => "total_assets",
            Self::TotalEquity => "total_equity",
            Self::RevenueSum => "revenue_sum",
            Self::RevenueAverage => "revenue_average",
            Self::RevenueMonths => "revenue_months",
            Self::GrossMarginPct => "gross_margin_pct",
            Self::NetMarginPct => "net_margin_pct",
            Self::RoaPct => "roa_pct",
            Self::RoePct => "roe_pct",
            Self::LeveragePct => "leverage_pct",
        }
    }
}

/// One `(quarter, security)` row of derived profitability.
///
/// Raw fields missing from the statements are NaN, as are undefined ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRecord {
    /// Fiscal quarter reported
    pub quarter: FiscalQuarter,
    /// Security code
    pub code: SecurityCode,
    /// Basic EPS
    pub basic_eps: f64,
    /// Non-operating income and expenses
    pub non_operating_income: f64,
    /// Gross profit
    pub gross_profit: f64,
    /// Net income
    pub net_income: f64,
    /// Total operating revenue
    pub operating_revenue: f64,
    /// Common-stock capital
    pub common_stock_capital: f64,
    /// Total assets
    pub total_assets: f64,
    /// Total equity
    pub total_equity: f64,
    /// Monthly revenue aggregated over the quarter
    pub revenue: RevenueAggregate,
    /// Gross margin %
    pub gross_margin_pct: f64,
    /// Net margin %
    pub net_margin_pct: f64,
    /// Return on assets %
    pub roa_pct: f64,
    /// Return on equity %
    pub roe_pct: f64,
    /// Liabilities over assets %
    pub leverage_pct: f64,
}

impl ProfitabilityRecord {
    /// Assemble a record from per-metric values.
    pub(crate) fn from_metrics(
        quarter: FiscalQuarter,
        code: SecurityCode,
        get: impl Fn(ProfitMetric) -> f64,
    ) -> Self {
        Self {
            quarter,
            code,
            basic_eps: get(ProfitMetric::BasicEps),
            non_operating_income: get(ProfitMetric::NonOperatingIncome),
            gross_profit: get(ProfitMetric::GrossProfit),
            net_income: get(ProfitMetric::NetIncome),
            operating_revenue: get(ProfitMetric::OperatingRevenue),
            common_stock_capital: get(ProfitMetric::CommonStockCapital),
            total_assets: get(ProfitMetric::TotalAssets),
            total_equity: get(ProfitMetric::TotalEquity),
            revenue: RevenueAggregate {
                sum: get(ProfitMetric::RevenueSum),
                average: get(ProfitMetric::RevenueAverage),
                months: get(ProfitMetric::RevenueMonths) as usize,
            },
            gross_margin_pct: get(ProfitMetric::GrossMarginPct),
            net_margin_pct: get(ProfitMetric::NetMarginPct),
            roa_pct: get(ProfitMetric::RoaPct),
            roe_pct: get(ProfitMetric::RoePct),
            leverage_pct: get(ProfitMetric::LeveragePct),
        }
    }

    /// Value of a metric.
    pub fn get(&self, metric: ProfitMetric) -> f64 {
        match metric {
            ProfitMetric::BasicEps => self.basic_eps,
            ProfitMetric::NonOperatingIncome => self.non_operating_income,
            ProfitMetric::GrossProfit => self.gross_profit,
            ProfitMetric::NetIncome => self.net_income,
            ProfitMetric::OperatingRevenue => self.operating_revenue,
            ProfitMetric::CommonStockCapital => self.common_stock_capital,
            ProfitMetric::TotalAssets => self.total_assets,
            ProfitMetric::TotalEquity => self.total_equity,
            ProfitMetric::RevenueSum => self.revenue.sum,
            ProfitMetric::RevenueAverage => self.revenue.average,
            ProfitMetric::RevenueMonths => self.revenue.months as f64,
            ProfitMetric::GrossMarginPct => self.gross_margin_pct,
            ProfitMetric::NetMarginPct => self.net_margin_pct,
            ProfitMetric::RoaPct => self.roa_pct,
            ProfitMetric::RoePct => self.roe_pct,
            ProfitMetric::LeveragePct => self.leverage_pct,
        }
    }
}

/// Profitability rows keyed by `(quarter, security)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfitabilityTable {
    rows: BTreeMap<(FiscalQuarter, SecurityCode), ProfitabilityRecord>,
}

impl ProfitabilityTable {
    /// Row for a quarter and security.
    pub fn get(&self, quarter: FiscalQuarter, code: &SecurityCode) -> Option<&ProfitabilityRecord> {
        self.rows.get(&(quarter, code.clone()))
    }

    /// Rows of one quarter, ordered by security.
    pub fn at(&self, quarter: FiscalQuarter) -> impl Iterator<Item = &ProfitabilityRecord> {
        self.rows
            .range((quarter, SecurityCode::default())..)
            .take_while(move |((q, _), _)| *q == quarter)
            .map(|(_, row)| row)
    }

    /// History of one security, oldest quarter first.
    pub fn for_security(&self, code: &SecurityCode) -> Vec<&ProfitabilityRecord> {
        self.rows.values().filter(|row| &row.code == code).collect()
    }

    /// Distinct quarters present, ascending.
    pub fn quarters(&self) -> Vec<FiscalQuarter> {
        let mut quarters: Vec<_> = self.rows.keys().map(|(q, _)| *q).collect();
        quarters.dedup();
        quarters
    }

    /// Latest quarter present.
    pub fn latest_quarter(&self) -> Option<FiscalQuarter> {
        self.rows.keys().next_back().map(|(q, _)| *q)
    }

    /// All rows ordered by `(quarter, code)`.
    pub fn iter(&self) -> impl Iterator<Item = &ProfitabilityRecord> {
        self.rows.values()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The table as a lazy frame keyed by `code` and integer `quarter`.
    pub fn to_lazy(&self) -> Result<LazyFrame> {
        let rows: Vec<&ProfitabilityRecord> = self.rows.values().collect();
        let mut columns = vec![
            Column::new(
                CODE.into(),
                rows.iter().map(|r| r.code.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                QUARTER.into(),
                rows.iter().map(|r| r.quarter.key()).collect::<Vec<_>>(),
            ),
        ];
        columns.extend(metric_columns(&rows));
        Ok(DataFrame::new(columns)?.lazy())
    }
}

impl FromIterator<ProfitabilityRecord> for ProfitabilityTable {
    fn from_iter<I: IntoIterator<Item = ProfitabilityRecord>>(iter: I) -> Self {
        Self {
            rows: iter
                .into_iter()
                .map(|row| ((row.quarter, row.code.clone()), row))
                .collect(),
        }
    }
}

// Re-key a statement panel by reported quarter. Later filings for the same
// quarter replace earlier ones.
fn by_quarter<T>(panel: &Panel<T>) -> BTreeMap<(FiscalQuarter, SecurityCode), &T> {
    let mut keyed = BTreeMap::new();
    let mut restated = 0usize;
    for (date, code, values) in panel.iter() {
        if keyed
            .insert((FiscalQuarter::reported_by(date), code.clone()), values)
            .is_some()
        {
            restated += 1;
        }
    }
    if restated > 0 {
        tracing::warn!(
            panel = %panel.kind(),
            restated,
            "several filings map to one quarter; kept the latest"
        );
    }
    keyed
}

// One row per reported quarter with the selected statement fields.
fn keyed_frame<T>(panel: &Panel<T>, fields: &[Field<T>]) -> Result<LazyFrame> {
    let keyed = by_quarter(panel);
    let mut columns = vec![
        Column::new(
            QUARTER.into(),
            keyed.keys().map(|(q, _)| q.key()).collect::<Vec<_>>(),
        ),
        Column::new(
            CODE.into(),
            keyed.keys().map(|(_, code)| code.as_str()).collect::<Vec<_>>(),
        ),
    ];
    for (metric, field) in fields {
        let values: Vec<Option<f64>> = keyed.values().map(|s| finite(field(*s))).collect();
        columns.push(Column::new(metric.name().into(), values));
    }
    Ok(DataFrame::new(columns)?.lazy())
}

// `num / den × 100`, null unless `valid` holds for the denominator.
fn ratio_pct(num: Expr, den: Expr, valid: Expr, metric: ProfitMetric) -> Expr {
    when(valid)
        .then(num / den * lit(100.0))
        .otherwise(lit(NULL))
        .alias(metric.name())
}

/// Inner join of income statements, balance sheets and quarter-bucketed
/// revenue on `(quarter, code)`, with the five ratios added.
///
/// `revenue` is a frame from [`aggregate_revenue_frame`]. The result has
/// `code`, an integer `quarter` key and one column per [`ProfitMetric`],
/// sorted by `(quarter, code)`.
pub fn profitability_frame(
    income: &Panel<IncomeStatement>,
    balance: &Panel<BalanceSheet>,
    revenue: LazyFrame,
) -> Result<LazyFrame> {
    let keys = || [col(QUARTER), col(CODE)];
    let net_income = || col(ProfitMetric::NetIncome.name());
    let operating_revenue = || col(ProfitMetric::OperatingRevenue.name());
    let total_assets = || col(ProfitMetric::TotalAssets.name());
    let total_equity = || col(ProfitMetric::TotalEquity.name());

    let mut selection = vec![col(CODE), col(QUARTER)];
    selection.extend(ProfitMetric::ALL.iter().map(|m| col(m.name())));

    Ok(keyed_frame(income, &INCOME_FIELDS)?
        .join(
            keyed_frame(balance, &BALANCE_FIELDS)?,
            keys(),
            keys(),
            JoinArgs::new(JoinType::Inner),
        )
        .join(revenue, keys(), keys(), JoinArgs::new(JoinType::Inner))
        .with_columns([
            ratio_pct(
                col(ProfitMetric::GrossProfit.name()),
                operating_revenue(),
                operating_revenue().neq(lit(0.0)),
                ProfitMetric::GrossMarginPct,
            ),
            ratio_pct(
                net_income(),
                operating_revenue(),
                operating_revenue().neq(lit(0.0)),
                ProfitMetric::NetMarginPct,
            ),
            ratio_pct(
                net_income(),
                total_assets(),
                total_assets().gt(lit(0.0)),
                ProfitMetric::RoaPct,
            ),
            ratio_pct(
                net_income(),
                total_equity(),
                total_equity().neq(lit(0.0)),
                ProfitMetric::RoePct,
            ),
            ratio_pct(
                total_assets() - total_equity(),
                total_assets(),
                total_assets().gt(lit(0.0)),
                ProfitMetric::LeveragePct,
            ),
        ])
        .select(selection)
        .sort([QUARTER, CODE], Default::default()))
}

/// Read profitability records out of a frame whose metric and `quarter`
/// columns carry `suffix`. A row with a null quarter yields `None`.
pub(crate) fn read_records(
    df: &DataFrame,
    suffix: &str,
) -> Result<Vec<Option<ProfitabilityRecord>>> {
    let codes = codes(df)?;
    let quarters = quarters(df, &format!("{QUARTER}{suffix}"))?;
    let values = ProfitMetric::ALL
        .iter()
        .map(|m| numbers(df, &format!("{}{suffix}", m.name())))
        .collect::<Result<Vec<_>>>()?;

    Ok(codes
        .into_iter()
        .zip(quarters)
        .enumerate()
        .map(|(i, (code, quarter))| {
            quarter.map(|quarter| {
                ProfitabilityRecord::from_metrics(quarter, code, |metric| {
                    values[metric.index()][i]
                })
            })
        })
        .collect())
}

/// Derive profitability for every `(quarter, security)` present in all of
/// income statements, balance sheets and aggregated revenue.
pub fn derive_profitability(
    income: &Panel<IncomeStatement>,
    balance: &Panel<BalanceSheet>,
    revenue: LazyFrame,
) -> Result<ProfitabilityTable> {
    let df = profitability_frame(income, balance, revenue)?.collect()?;
    let table: ProfitabilityTable = read_records(&df, "")?.into_iter().flatten().collect();

    tracing::debug!(
        income = income.len(),
        balance = balance.len(),
        rows = table.len(),
        "derived profitability"
    );
    Ok(table)
}

/// Aggregate revenue and derive profitability from the store's panels.
pub fn derive_from_store(store: &PanelStore) -> Result<ProfitabilityTable> {
    derive_profitability(
        store.income_statements()?,
        store.balance_sheets()?,
        aggregate_revenue_frame(store.revenue()?)?,
    )
}
