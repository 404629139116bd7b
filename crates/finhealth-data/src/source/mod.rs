//! Acquisition boundary.
//!
//! A [`PanelSource`] hands the store already-parsed records. The store never
//! talks to a database or the network itself; adapters implement this trait.

pub mod csv;
pub mod frame;
pub mod memory;

pub use self::csv::CsvDirSource;
pub use frame::FrameSource;
pub use memory::MemorySource;

use crate::{
    error::{DataError, Result},
    record::{
        BalanceSheet, CashFlowStatement, IncomeStatement, PriceRecord, RevenueRecord,
        TimedRecord, ValuationRecord,
    },
    security::Security,
};
use chrono::NaiveDate;

/// Supplier of panel records.
///
/// Every timed method returns the records dated on or after `since`.
pub trait PanelSource {
    /// Static security attributes.
    fn securities(&self) -> Result<Vec<Security>>;

    /// Daily prices.
    fn prices(&self, since: NaiveDate) -> Result<Vec<TimedRecord<PriceRecord>>>;

    /// Daily valuation multiples.
    fn valuations(&self, since: NaiveDate) -> Result<Vec<TimedRecord<ValuationRecord>>>;

    /// Monthly revenue reports.
    fn revenue(&self, since: NaiveDate) -> Result<Vec<TimedRecord<RevenueRecord>>>;

    /// Single-quarter income statements.
    fn income_statements(&self, since: NaiveDate) -> Result<Vec<TimedRecord<IncomeStatement>>>;

    /// Cumulative (year-to-date) income statements.
    fn cumulative_income_statements(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<TimedRecord<IncomeStatement>>>;

    /// Balance sheets.
    fn balance_sheets(&self, since: NaiveDate) -> Result<Vec<TimedRecord<BalanceSheet>>>;

    /// Cash flow statements.
    fn cash_flows(&self, since: NaiveDate) -> Result<Vec<TimedRecord<CashFlowStatement>>>;
}

impl<S: PanelSource + ?Sized> PanelSource for &S {
    fn securities(&self) -> Result<Vec<Security>> {
        (**self).securities()
    }

    fn prices(&self, since: NaiveDate) -> Result<Vec<TimedRecord<PriceRecord>>> {
        (**self).prices(since)
    }

    fn valuations(&self, since: NaiveDate) -> Result<Vec<TimedRecord<ValuationRecord>>> {
        (**self).valuations(since)
    }

    fn revenue(&self, since: NaiveDate) -> Result<Vec<TimedRecord<RevenueRecord>>> {
        (**self).revenue(since)
    }

    fn income_statements(&self, since: NaiveDate) -> Result<Vec<TimedRecord<IncomeStatement>>> {
        (**self).income_statements(since)
    }

    fn cumulative_income_statements(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<TimedRecord<IncomeStatement>>> {
        (**self).cumulative_income_statements(since)
    }

    fn balance_sheets(&self, since: NaiveDate) -> Result<Vec<TimedRecord<BalanceSheet>>> {
        (**self).balance_sheets(since)
    }

    fn cash_flows(&self, since: NaiveDate) -> Result<Vec<TimedRecord<CashFlowStatement>>> {
        (**self).cash_flows(since)
    }
}

/// Parse an ISO date, ignoring a trailing time component.
pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("invalid date '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(parse_date("2024-05-15").unwrap(), expected);
        assert_eq!(parse_date(" 2024-05-15 00:00:00").unwrap(), expected);
        assert!(parse_date("15/05/2024").is_err());
    }
}
