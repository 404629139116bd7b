//! In-memory source, for embedding and tests.

use super::PanelSource;
use crate::{
    error::Result,
    record::{
        BalanceSheet, CashFlowStatement, IncomeStatement, PriceRecord, RevenueRecord,
        TimedRecord, ValuationRecord,
    },
    security::Security,
};
use chrono::NaiveDate;

/// Source backed by plain vectors of records.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    /// Static security attributes
    pub securities: Vec<Security>,
    /// Daily prices
    pub prices: Vec<TimedRecord<PriceRecord>>,
    /// Daily valuation multiples
    pub valuations: Vec<TimedRecord<ValuationRecord>>,
    /// Monthly revenue
    pub revenue: Vec<TimedRecord<RevenueRecord>>,
    /// Single-quarter income statements
    pub income_statements: Vec<TimedRecord<IncomeStatement>>,
    /// Cumulative income statements
    pub cumulative_income_statements: Vec<TimedRecord<IncomeStatement>>,
    /// Balance sheets
    pub balance_sheets: Vec<TimedRecord<BalanceSheet>>,
    /// Cash flow statements
    pub cash_flows: Vec<TimedRecord<CashFlowStatement>>,
}

fn since_filter<T: Clone>(records: &[TimedRecord<T>], since: NaiveDate) -> Vec<TimedRecord<T>> {
    records
        .iter()
        .filter(|r| r.date >= since)
        .cloned()
        .collect()
}

impl PanelSource for MemorySource {
    fn securities(&self) -> Result<Vec<Security>> {
        Ok(self.securities.clone())
    }

    fn prices(&self, since: NaiveDate) -> Result<Vec<TimedRecord<PriceRecord>>> {
        Ok(since_filter(&self.prices, since))
    }

    fn valuations(&self, since: NaiveDate) -> Result<Vec<TimedRecord<ValuationRecord>>> {
        Ok(since_filter(&self.valuations, since))
    }

    fn revenue(&self, since: NaiveDate) -> Result<Vec<TimedRecord<RevenueRecord>>> {
        Ok(since_filter(&self.revenue, since))
    }

    fn income_statements(&self, since: NaiveDate) -> Result<Vec<TimedRecord<IncomeStatement>>> {
        Ok(since_filter(&self.income_statements, since))
    }

    fn cumulative_income_statements(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<TimedRecord<IncomeStatement>>> {
        Ok(since_filter(&self.cumulative_income_statements, since))
    }

    fn balance_sheets(&self, since: NaiveDate) -> Result<Vec<TimedRecord<BalanceSheet>>> {
        Ok(since_filter(&self.balance_sheets, since))
    }

    fn cash_flows(&self, since: NaiveDate) -> Result<Vec<TimedRecord<CashFlowStatement>>> {
        Ok(since_filter(&self.cash_flows, since))
    }
}
