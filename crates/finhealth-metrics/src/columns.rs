//! Column Catalog
//!
//! Named export columns of a [`FeatureRow`], grouped the way reports select
//! them. Labels follow the established report conventions: `E(k)` for basic
//! EPS at offset k, `外(k)` for non-operating income, `外%(k)` for its share of
//! net income, `(C)EPS`/`(C)PER` for the custom EPS and P/E, and a `_qk`
//! suffix for profitability metrics k quarters back.

use crate::{
    features::{FeatureRow, GrowthDeltas, QuarterOffset},
    profitability::ProfitMetric,
};

/// Column groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnGroup {
    /// Code, name, industry group and quarter
    Security,
    /// Latest close and change
    Price,
    /// Latest valuation multiples
    Valuation,
    /// Custom EPS/P/E and EPS aggregates
    EpsAnalysis,
    /// Ratios of the latest quarter
    Profitability,
    /// Quarter-bucketed monthly revenue of the latest quarter
    CustomRevenue,
    /// Current minus previous quarter
    Delta,
    /// Per-offset values beyond the EPS analysis selection
    Lookback,
}

/// How a column reads its value from a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnValue {
    /// Security code
    Code,
    /// Security name
    Name,
    /// Industry group
    Group,
    /// Latest quarter label
    Quarter,
    /// Close price
    Close,
    /// Daily change %
    ChangePct,
    /// Dividend yield %
    DividendYield,
    /// Dividend year
    DividendYear,
    /// P/E ratio
    PeRatio,
    /// P/B ratio
    PbRatio,
    /// Custom P/E
    CustomPe,
    /// Custom EPS
    CustomEps,
    /// EPS sum over offsets 0..=3
    EpsSum,
    /// EPS mean over offsets 0..=3
    EpsMean,
    /// EPS standard deviation over offsets 0..=3
    EpsStd,
    /// Non-operating income share of net income at an offset
    NonOperatingPct(QuarterOffset),
    /// Profitability metric at an offset
    Metric(ProfitMetric, QuarterOffset),
    /// Current minus previous quarter
    Delta(ProfitMetric),
}

/// A value read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Text; `None` when absent
    Text(Option<String>),
    /// Whole number; `None` when absent
    Integer(Option<i64>),
    /// Float; `None` when absent or not finite
    Number(Option<f64>),
}

impl Cell {
    fn number(value: f64) -> Self {
        Self::Number(value.is_finite().then_some(value))
    }

    fn optional(value: Option<f64>) -> Self {
        Self::Number(value.filter(|v| v.is_finite()))
    }
}

impl ColumnValue {
    /// Read the value from a row.
    pub fn read(&self, row: &FeatureRow) -> Cell {
        let security = row.security.as_ref();
        match *self {
            Self::Code => Cell::Text(Some(row.code.to_string())),
            Self::Name => Cell::Text(security.map(|s| s.name.clone())),
            Self::Group => Cell::Text(security.map(|s| s.group.clone())),
            Self::Quarter => Cell::Text(Some(row.quarter.to_string())),
            Self::Close => Cell::number(row.close()),
            Self::ChangePct => Cell::optional(row.price.as_ref().and_then(|p| p.change_pct)),
            Self::DividendYield => Cell::optional(row.valuation.dividend_yield_pct),
            Self::DividendYear => Cell::Integer(row.valuation.dividend_year.map(i64::from)),
            Self::PeRatio => Cell::optional(row.valuation.pe_ratio),
            Self::PbRatio => Cell::optional(row.valuation.pb_ratio),
            Self::CustomPe => Cell::number(row.custom_pe),
            Self::CustomEps => Cell::number(row.custom_eps),
            Self::EpsSum => Cell::number(row.eps.sum),
            Self::EpsMean => Cell::number(row.eps.mean),
            Self::EpsStd => Cell::number(row.eps.std),
            Self::NonOperatingPct(offset) => Cell::number(row.non_operating_pct(offset)),
            Self::Metric(metric, offset) => Cell::number(row.metric(offset, metric)),
            Self::Delta(metric) => Cell::number(row.deltas.get(metric)),
        }
    }

    /// Whether the column holds text.
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Code | Self::Name | Self::Group | Self::Quarter)
    }

    /// Whether the column holds whole numbers.
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::DividendYear)
    }
}

/// Column metadata
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Export label (unique)
    pub label: String,
    /// Column group
    pub group: ColumnGroup,
    /// Brief description
    pub description: String,
    /// Value accessor
    pub value: ColumnValue,
}

impl ColumnInfo {
    fn new(
        label: impl Into<String>,
        group: ColumnGroup,
        description: impl Into<String>,
        value: ColumnValue,
    ) -> Self {
        Self {
            label: label.into(),
            group,
            description: description.into(),
            value,
        }
    }
}

const RATIO_DESCRIPTIONS: [(ProfitMetric, &str); 5] = [
    (ProfitMetric::GrossMarginPct, "Gross profit over operating revenue %"),
    (ProfitMetric::NetMarginPct, "Net income over operating revenue %"),
    (ProfitMetric::RoaPct, "Net income over total assets %"),
    (ProfitMetric::RoePct, "Net income over total equity %"),
    (ProfitMetric::LeveragePct, "Liabilities over total assets %"),
];

/// Get all available columns
pub fn available_columns() -> Vec<ColumnInfo> {
    use ColumnGroup as G;
    use ColumnValue as V;

    let mut columns = vec![
        // Security
        ColumnInfo::new("code", G::Security, "Security code", V::Code),
        ColumnInfo::new("name", G::Security, "Security name", V::Name),
        ColumnInfo::new("group", G::Security, "Industry group", V::Group),
        ColumnInfo::new("quarter", G::Security, "Latest reported quarter", V::Quarter),
        // Price
        ColumnInfo::new("close", G::Price, "Latest close", V::Close),
        ColumnInfo::new("change_pct", G::Price, "Latest daily change %", V::ChangePct),
        // Valuation
        ColumnInfo::new("dividend_yield_pct", G::Valuation, "Dividend yield %", V::DividendYield),
        ColumnInfo::new("dividend_year", G::Valuation, "Dividend year", V::DividendYear),
        ColumnInfo::new("pe_ratio", G::Valuation, "Price to earnings", V::PeRatio),
        ColumnInfo::new("pb_ratio", G::Valuation, "Price to book", V::PbRatio),
        // EPS analysis
        ColumnInfo::new("(C)PER", G::EpsAnalysis, "Close over annualized custom EPS", V::CustomPe),
        ColumnInfo::new(
            "(C)EPS",
            G::EpsAnalysis,
            "Net income over common-stock capital × 10",
            V::CustomEps,
        ),
        ColumnInfo::new("E(Sum)", G::EpsAnalysis, "Basic EPS sum over 4 quarters", V::EpsSum),
        ColumnInfo::new("E(Avg)", G::EpsAnalysis, "Basic EPS mean over 4 quarters", V::EpsMean),
        ColumnInfo::new(
            "E(Std)",
            G::EpsAnalysis,
            "Basic EPS population std over 4 quarters",
            V::EpsStd,
        ),
    ];

    for offset in QuarterOffset::all() {
        let group = if offset < QuarterOffset::MAX {
            G::EpsAnalysis
        } else {
            G::Lookback
        };
        columns.push(ColumnInfo::new(
            format!("E({offset})"),
            group,
            format!("Basic EPS {offset} quarters back"),
            V::Metric(ProfitMetric::BasicEps, offset),
        ));
    }
    for offset in QuarterOffset::all().take(4) {
        columns.push(ColumnInfo::new(
            format!("外%({offset})"),
            G::EpsAnalysis,
            format!("Non-operating income over net income % {offset} quarters back"),
            V::NonOperatingPct(offset),
        ));
    }
    for offset in QuarterOffset::all() {
        columns.push(ColumnInfo::new(
            format!("外({offset})"),
            G::Lookback,
            format!("Non-operating income {offset} quarters back"),
            V::Metric(ProfitMetric::NonOperatingIncome, offset),
        ));
    }

    for offset in QuarterOffset::all() {
        let group = if offset == QuarterOffset::CURRENT {
            G::Profitability
        } else {
            G::Lookback
        };
        for (metric, description) in RATIO_DESCRIPTIONS {
            columns.push(ColumnInfo::new(
                format!("{}{}", metric.name(), offset.suffix()),
                group,
                description,
                V::Metric(metric, offset),
            ));
        }
    }

    for (metric, description) in [
        (ProfitMetric::RevenueSum, "Monthly revenue summed over the quarter"),
        (ProfitMetric::RevenueAverage, "Average monthly revenue of the quarter"),
        (ProfitMetric::RevenueMonths, "Months of revenue reported in the quarter"),
    ] {
        columns.push(ColumnInfo::new(
            metric.name(),
            G::CustomRevenue,
            description,
            V::Metric(metric, QuarterOffset::CURRENT),
        ));
    }

    for metric in GrowthDeltas::METRICS {
        columns.push(ColumnInfo::new(
            format!("{}_delta", metric.name()),
            G::Delta,
            format!("Change in {} from the previous quarter", metric.name()),
            V::Delta(metric),
        ));
    }

    columns
}

/// Get columns by group
pub fn columns_by_group(group: ColumnGroup) -> Vec<ColumnInfo> {
    available_columns()
        .into_iter()
        .filter(|c| c.group == group)
        .collect()
}

/// Get column info by label
pub fn column_info(label: &str) -> Option<ColumnInfo> {
    available_columns().into_iter().find(|c| c.label == label)
}

/// Columns of the default feature export: security, price, valuation, EPS
/// analysis and deltas.
pub fn default_feature_columns() -> Vec<ColumnInfo> {
    const GROUPS: [ColumnGroup; 5] = [
        ColumnGroup::Security,
        ColumnGroup::Price,
        ColumnGroup::Valuation,
        ColumnGroup::EpsAnalysis,
        ColumnGroup::Delta,
    ];
    available_columns()
        .into_iter()
        .filter(|c| GROUPS.contains(&c.group))
        .collect()
}
