//! Panel row types.
//!
//! Every panel row is a [`TimedRecord`] keyed by `(date, code)`. The payload
//! types implement [`PanelRecord`], which fixes the column contract shared by
//! the DataFrame and CSV adapters: a `date` column, a `code` column, and the
//! numeric columns listed in [`PanelRecord::COLUMNS`] in order.

use crate::{panel::PanelKind, security::SecurityCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A panel row keyed by `(date, code)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedRecord<T> {
    /// Observation or filing date
    pub date: NaiveDate,
    /// Security code
    pub code: SecurityCode,
    /// Panel-specific fields
    pub values: T,
}

impl<T> TimedRecord<T> {
    /// Create a new timed record.
    pub fn new(date: NaiveDate, code: impl Into<SecurityCode>, values: T) -> Self {
        Self {
            date,
            code: code.into(),
            values,
        }
    }
}

/// Column contract of a panel payload type.
pub trait PanelRecord: Clone + Sized {
    /// Panel this record belongs to.
    const KIND: PanelKind;

    /// Numeric column names, in the order expected by [`PanelRecord::from_values`].
    const COLUMNS: &'static [&'static str];

    /// Build a record from values ordered like [`PanelRecord::COLUMNS`].
    fn from_values(values: &[Option<f64>]) -> Self;
}

fn at(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values.get(idx).copied().flatten()
}

/// Daily trading price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Closing price
    pub close: Option<f64>,
    /// Price change (%)
    pub change_pct: Option<f64>,
}

impl PanelRecord for PriceRecord {
    const KIND: PanelKind = PanelKind::Prices;
    const COLUMNS: &'static [&'static str] = &["close", "change_pct"];

    fn from_values(values: &[Option<f64>]) -> Self {
        Self {
            close: at(values, 0),
            change_pct: at(values, 1),
        }
    }
}

/// Daily valuation multiples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationRecord {
    /// Dividend yield (%)
    pub dividend_yield_pct: Option<f64>,
    /// Fiscal year the dividend belongs to
    pub dividend_year: Option<i32>,
    /// Reported price/earnings ratio
    pub pe_ratio: Option<f64>,
    /// Reported price/book ratio
    pub pb_ratio: Option<f64>,
}

impl PanelRecord for ValuationRecord {
    const KIND: PanelKind = PanelKind::Valuations;
    const COLUMNS: &'static [&'static str] =
        &["dividend_yield_pct", "dividend_year", "pe_ratio", "pb_ratio"];

    fn from_values(values: &[Option<f64>]) -> Self {
        Self {
            dividend_yield_pct: at(values, 0),
            dividend_year: at(values, 1)
                .filter(|v| v.is_finite())
                .map(|v| v as i32),
            pe_ratio: at(values, 2),
            pb_ratio: at(values, 3),
        }
    }
}

/// Monthly revenue report.
///
/// A report dated day D carries the revenue of the month before D.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueRecord {
    /// Revenue of the reported month
    pub monthly_revenue: Option<f64>,
    /// Year-over-year change (%)
    pub yoy_pct: Option<f64>,
    /// Month-over-month change (%)
    pub mom_pct: Option<f64>,
}

impl PanelRecord for RevenueRecord {
    const KIND: PanelKind = PanelKind::Revenue;
    const COLUMNS: &'static [&'static str] = &["monthly_revenue", "yoy_pct", "mom_pct"];

    fn from_values(values: &[Option<f64>]) -> Self {
        Self {
            monthly_revenue: at(values, 0),
            yoy_pct: at(values, 1),
            mom_pct: at(values, 2),
        }
    }
}

/// Quarterly income statement.
///
/// The same layout is used for the single-quarter and the cumulative
/// (year-to-date) statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// Basic earnings per share
    pub basic_eps: Option<f64>,
    /// Total non-operating income and expenses
    pub non_operating_income: Option<f64>,
    /// Gross profit (loss)
    pub gross_profit: Option<f64>,
    /// Gross profit (loss), net
    pub gross_profit_net: Option<f64>,
    /// Net income (loss) for the period
    pub net_income: Option<f64>,
    /// Total operating revenue
    pub operating_revenue: Option<f64>,
    /// Pre-tax income of continuing operations
    pub pretax_income_continuing: Option<f64>,
    /// Net income of continuing operations for the period
    pub net_income_continuing: Option<f64>,
    /// Net income attributable to owners of the parent
    pub net_income_parent: Option<f64>,
    /// Net income of continuing units
    pub continuing_unit_income: Option<f64>,
    /// Net income of discontinued units
    pub discontinued_unit_income: Option<f64>,
}

impl PanelRecord for IncomeStatement {
    const KIND: PanelKind = PanelKind::IncomeStatement;
    const COLUMNS: &'static [&'static str] = &[
        "basic_eps",
        "non_operating_income",
        "gross_profit",
        "gross_profit_net",
        "net_income",
        "operating_revenue",
        "pretax_income_continuing",
        "net_income_continuing",
        "net_income_parent",
        "continuing_unit_income",
        "discontinued_unit_income",
    ];

    fn from_values(values: &[Option<f64>]) -> Self {
        Self {
            basic_eps: at(values, 0),
            non_operating_income: at(values, 1),
            gross_profit: at(values, 2),
            gross_profit_net: at(values, 3),
            net_income: at(values, 4),
            operating_revenue: at(values, 5),
            pretax_income_continuing: at(values, 6),
            net_income_continuing: at(values, 7),
            net_income_parent: at(values, 8),
            continuing_unit_income: at(values, 9),
            discontinued_unit_income: at(values, 10),
        }
    }
}

/// Quarterly balance sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Common stock capital
    pub common_stock_capital: Option<f64>,
    /// Total assets
    pub total_assets: Option<f64>,
    /// Total equity
    pub total_equity: Option<f64>,
    /// Total liabilities
    pub total_liabilities: Option<f64>,
}

impl PanelRecord for BalanceSheet {
    const KIND: PanelKind = PanelKind::BalanceSheet;
    const COLUMNS: &'static [&'static str] = &[
        "common_stock_capital",
        "total_assets",
        "total_equity",
        "total_liabilities",
    ];

    fn from_values(values: &[Option<f64>]) -> Self {
        Self {
            common_stock_capital: at(values, 0),
            total_assets: at(values, 1),
            total_equity: at(values, 2),
            total_liabilities: at(values, 3),
        }
    }
}

/// Quarterly cash flow statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    /// Net cash from operating activities
    pub operating_cash_flow: Option<f64>,
    /// Net cash from investing activities
    pub investing_cash_flow: Option<f64>,
    /// Net cash from financing activities
    pub financing_cash_flow: Option<f64>,
    /// Acquisition of property, plant and equipment
    pub capital_expenditure: Option<f64>,
}

impl PanelRecord for CashFlowStatement {
    const KIND: PanelKind = PanelKind::CashFlow;
    const COLUMNS: &'static [&'static str] = &[
        "operating_cash_flow",
        "investing_cash_flow",
        "financing_cash_flow",
        "capital_expenditure",
    ];

    fn from_values(values: &[Option<f64>]) -> Self {
        Self {
            operating_cash_flow: at(values, 0),
            investing_cash_flow: at(values, 1),
            financing_cash_flow: at(values, 2),
            capital_expenditure: at(values, 3),
        }
    }
}
