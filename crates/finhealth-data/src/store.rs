//! Panel store.
//!
//! The store owns the latest refresh of every panel. Each `refresh_*` call
//! replaces its panel wholesale, together with the panel's date bounds, and
//! leaves the store untouched when it fails.
//! Readers get [`DataError::MissingPanel`] for a panel that was never
//! refreshed rather than stale or empty data.

use crate::{
    error::{DataError, Result},
    panel::{Panel, PanelBounds, PanelKind, Snapshot},
    record::{
        BalanceSheet, CashFlowStatement, IncomeStatement, PriceRecord, RevenueRecord,
        TimedRecord, ValuationRecord,
    },
    security::{Security, SecurityCode},
    source::PanelSource,
};
use chrono::{Days, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default lookback of each panel's refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshWindows {
    /// Days of prices to load (default: 10)
    pub price_days: u64,
    /// Days of valuation multiples to load (default: 10)
    pub valuation_days: u64,
    /// Years of financial statements to load (default: 5)
    pub statement_years: u32,
    /// Months of revenue loaded before the statement window (default: 5)
    pub revenue_lead_months: u32,
    /// Date the windows are measured back from (default: today)
    pub reference_date: Option<NaiveDate>,
}

impl Default for RefreshWindows {
    fn default() -> Self {
        Self {
            price_days: 10,
            valuation_days: 10,
            statement_years: 5,
            revenue_lead_months: 5,
            reference_date: None,
        }
    }
}

impl RefreshWindows {
    fn reference(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn statement_start(&self) -> NaiveDate {
        self.reference()
            .checked_sub_months(Months::new(self.statement_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Earliest date loaded by default for a panel.
    pub fn since(&self, kind: PanelKind) -> NaiveDate {
        let days_back = |days: u64| {
            self.reference()
                .checked_sub_days(Days::new(days))
                .unwrap_or(NaiveDate::MIN)
        };
        match kind {
            PanelKind::Prices => days_back(self.price_days),
            PanelKind::Valuations => days_back(self.valuation_days),
            PanelKind::Revenue => self
                .statement_start()
                .checked_sub_months(Months::new(self.revenue_lead_months))
                .unwrap_or(NaiveDate::MIN),
            PanelKind::IncomeStatement
            | PanelKind::CumulativeIncomeStatement
            | PanelKind::BalanceSheet
            | PanelKind::CashFlow => self.statement_start(),
            PanelKind::Securities => NaiveDate::MIN,
        }
    }
}

/// The four statement panels, refreshed together.
#[derive(Debug, Clone)]
pub struct StatementPanels {
    /// Single-quarter income statements
    pub income: Panel<IncomeStatement>,
    /// Cumulative income statements
    pub cumulative_income: Panel<IncomeStatement>,
    /// Balance sheets
    pub balance: Panel<BalanceSheet>,
    /// Cash flow statements
    pub cash_flow: Panel<CashFlowStatement>,
}

impl StatementPanels {
    /// Statement bounds, taken from the balance sheet panel.
    pub const fn bounds(&self) -> Option<PanelBounds> {
        self.balance.bounds()
    }
}

/// In-memory holder of all panels.
#[derive(Debug, Clone, Default)]
pub struct PanelStore {
    windows: RefreshWindows,
    securities: Option<BTreeMap<SecurityCode, Security>>,
    prices: Option<Panel<PriceRecord>>,
    valuations: Option<Panel<ValuationRecord>>,
    revenue: Option<Panel<RevenueRecord>>,
    statements: Option<StatementPanels>,
}

fn load<T>(
    kind: PanelKind,
    since: NaiveDate,
    fetched: Result<Vec<TimedRecord<T>>>,
) -> Result<Panel<T>> {
    let records = fetched?;
    let fetched_len = records.len();
    let panel = Panel::from_records(kind, records.into_iter().filter(|r| r.date >= since));
    match panel.bounds() {
        Some(bounds) => tracing::info!(
            panel = %kind,
            records = panel.len(),
            min = %bounds.min,
            max = %bounds.max,
            "refreshed panel"
        ),
        None => tracing::warn!(
            panel = %kind,
            %since,
            fetched = fetched_len,
            "refreshed panel is empty"
        ),
    }
    Ok(panel)
}

impl PanelStore {
    /// Create an empty store with default refresh windows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with custom refresh windows.
    pub fn with_windows(windows: RefreshWindows) -> Self {
        Self {
            windows,
            ..Self::default()
        }
    }

    /// Refresh windows in use.
    pub const fn windows(&self) -> &RefreshWindows {
        &self.windows
    }

    fn since(&self, kind: PanelKind, since: Option<NaiveDate>) -> NaiveDate {
        since.unwrap_or_else(|| self.windows.since(kind))
    }

    /// Replace the securities table.
    pub fn refresh_securities<S: PanelSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        let securities: BTreeMap<_, _> = source
            .securities()?
            .into_iter()
            .map(|s| (s.code.clone(), s))
            .collect();
        tracing::info!(securities = securities.len(), "refreshed securities");
        self.securities = Some(securities);
        Ok(())
    }

    /// Replace the price panel with records dated on or after `since`
    /// (default window when `None`).
    pub fn refresh_prices<S: PanelSource + ?Sized>(
        &mut self,
        source: &S,
        since: Option<NaiveDate>,
    ) -> Result<()> {
        let since = self.since(PanelKind::Prices, since);
        self.prices = Some(load(PanelKind::Prices, since, source.prices(since))?);
        Ok(())
    }

    /// Replace the valuation panel.
    pub fn refresh_valuations<S: PanelSource + ?Sized>(
        &mut self,
        source: &S,
        since: Option<NaiveDate>,
    ) -> Result<()> {
        let since = self.since(PanelKind::Valuations, since);
        self.valuations = Some(load(PanelKind::Valuations, since, source.valuations(since))?);
        Ok(())
    }

    /// Replace the revenue panel.
    pub fn refresh_revenue<S: PanelSource + ?Sized>(
        &mut self,
        source: &S,
        since: Option<NaiveDate>,
    ) -> Result<()> {
        let since = self.since(PanelKind::Revenue, since);
        self.revenue = Some(load(PanelKind::Revenue, since, source.revenue(since))?);
        Ok(())
    }

    /// Replace all four statement panels.
    ///
    /// The store is left untouched if any of the four fetches fails.
    pub fn refresh_statements<S: PanelSource + ?Sized>(
        &mut self,
        source: &S,
        since: Option<NaiveDate>,
    ) -> Result<()> {
        let since = self.since(PanelKind::BalanceSheet, since);
        let statements = StatementPanels {
            income: load(PanelKind::IncomeStatement, since, source.income_statements(since))?,
            cumulative_income: load(
                PanelKind::CumulativeIncomeStatement,
                since,
                source.cumulative_income_statements(since),
            )?,
            balance: load(PanelKind::BalanceSheet, since, source.balance_sheets(since))?,
            cash_flow: load(PanelKind::CashFlow, since, source.cash_flows(since))?,
        };
        self.statements = Some(statements);
        Ok(())
    }

    /// Refresh every panel with its default window.
    ///
    /// Panels are loaded into a fresh store that replaces this one only once
    /// every panel has loaded.
    pub fn refresh_all<S: PanelSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        *self = Self::load_all(self.windows.clone(), source)?;
        Ok(())
    }

    /// Build a store with `windows` and every panel loaded from `source`.
    pub fn load_all<S: PanelSource + ?Sized>(windows: RefreshWindows, source: &S) -> Result<Self> {
        let mut store = Self::with_windows(windows);
        store.refresh_securities(source)?;
        store.refresh_prices(source, None)?;
        store.refresh_valuations(source, None)?;
        store.refresh_revenue(source, None)?;
        store.refresh_statements(source, None)?;
        Ok(store)
    }

    /// Securities by code.
    pub fn securities(&self) -> Result<&BTreeMap<SecurityCode, Security>> {
        self.securities
            .as_ref()
            .ok_or(DataError::MissingPanel(PanelKind::Securities))
    }

    /// Price panel.
    pub fn prices(&self) -> Result<&Panel<PriceRecord>> {
        self.prices
            .as_ref()
            .ok_or(DataError::MissingPanel(PanelKind::Prices))
    }

    /// Valuation panel.
    pub fn valuations(&self) -> Result<&Panel<ValuationRecord>> {
        self.valuations
            .as_ref()
            .ok_or(DataError::MissingPanel(PanelKind::Valuations))
    }

    /// Revenue panel.
    pub fn revenue(&self) -> Result<&Panel<RevenueRecord>> {
        self.revenue
            .as_ref()
            .ok_or(DataError::MissingPanel(PanelKind::Revenue))
    }

    /// Statement panels.
    pub fn statements(&self) -> Result<&StatementPanels> {
        self.statements
            .as_ref()
            .ok_or(DataError::MissingPanel(PanelKind::BalanceSheet))
    }

    /// Income statement panel.
    pub fn income_statements(&self) -> Result<&Panel<IncomeStatement>> {
        self.statements
            .as_ref()
            .map(|s| &s.income)
            .ok_or(DataError::MissingPanel(PanelKind::IncomeStatement))
    }

    /// Cumulative income statement panel.
    pub fn cumulative_income_statements(&self) -> Result<&Panel<IncomeStatement>> {
        self.statements
            .as_ref()
            .map(|s| &s.cumulative_income)
            .ok_or(DataError::MissingPanel(PanelKind::CumulativeIncomeStatement))
    }

    /// Balance sheet panel.
    pub fn balance_sheets(&self) -> Result<&Panel<BalanceSheet>> {
        self.statements
            .as_ref()
            .map(|s| &s.balance)
            .ok_or(DataError::MissingPanel(PanelKind::BalanceSheet))
    }

    /// Cash flow panel.
    pub fn cash_flows(&self) -> Result<&Panel<CashFlowStatement>> {
        self.statements
            .as_ref()
            .map(|s| &s.cash_flow)
            .ok_or(DataError::MissingPanel(PanelKind::CashFlow))
    }

    /// Observed bounds of a timed panel; `None` if never refreshed or empty.
    pub fn bounds(&self, kind: PanelKind) -> Option<PanelBounds> {
        match kind {
            PanelKind::Securities => None,
            PanelKind::Prices => self.prices.as_ref()?.bounds(),
            PanelKind::Valuations => self.valuations.as_ref()?.bounds(),
            PanelKind::Revenue => self.revenue.as_ref()?.bounds(),
            PanelKind::IncomeStatement => self.statements.as_ref()?.income.bounds(),
            PanelKind::CumulativeIncomeStatement => {
                self.statements.as_ref()?.cumulative_income.bounds()
            }
            PanelKind::BalanceSheet => self.statements.as_ref()?.balance.bounds(),
            PanelKind::CashFlow => self.statements.as_ref()?.cash_flow.bounds(),
        }
    }

    /// Prices at the panel's max date.
    pub fn latest_prices(&self) -> Result<Snapshot<PriceRecord>> {
        self.prices()?
            .latest()
            .ok_or(DataError::EmptyPanel(PanelKind::Prices))
    }

    /// Valuation multiples at the panel's max date.
    pub fn latest_valuations(&self) -> Result<Snapshot<ValuationRecord>> {
        self.valuations()?
            .latest()
            .ok_or(DataError::EmptyPanel(PanelKind::Valuations))
    }

    /// Max date of the statement panels (balance sheet bounds).
    pub fn latest_statement_date(&self) -> Result<NaiveDate> {
        self.statements()?
            .bounds()
            .map(|b| b.max)
            .ok_or(DataError::EmptyPanel(PanelKind::BalanceSheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use rstest::rstest;

    // Delegates to `inner` except for one panel, which fails.
    struct FailingSource {
        inner: MemorySource,
        failing: PanelKind,
    }

    impl FailingSource {
        fn check(&self, kind: PanelKind) -> Result<()> {
            if kind == self.failing {
                return Err(DataError::Source(format!("{kind} unavailable")));
            }
            Ok(())
        }
    }

    impl PanelSource for FailingSource {
        fn securities(&self) -> Result<Vec<Security>> {
            self.check(PanelKind::Securities)?;
            self.inner.securities()
        }

        fn prices(&self, since: NaiveDate) -> Result<Vec<TimedRecord<PriceRecord>>> {
            self.check(PanelKind::Prices)?;
            self.inner.prices(since)
        }

        fn valuations(&self, since: NaiveDate) -> Result<Vec<TimedRecord<ValuationRecord>>> {
            self.check(PanelKind::Valuations)?;
            self.inner.valuations(since)
        }

        fn revenue(&self, since: NaiveDate) -> Result<Vec<TimedRecord<RevenueRecord>>> {
            self.check(PanelKind::Revenue)?;
            self.inner.revenue(since)
        }

        fn income_statements(&self, since: NaiveDate) -> Result<Vec<TimedRecord<IncomeStatement>>> {
            self.check(PanelKind::IncomeStatement)?;
            self.inner.income_statements(since)
        }

        fn cumulative_income_statements(
            &self,
            since: NaiveDate,
        ) -> Result<Vec<TimedRecord<IncomeStatement>>> {
            self.check(PanelKind::CumulativeIncomeStatement)?;
            self.inner.cumulative_income_statements(since)
        }

        fn balance_sheets(&self, since: NaiveDate) -> Result<Vec<TimedRecord<BalanceSheet>>> {
            self.check(PanelKind::BalanceSheet)?;
            self.inner.balance_sheets(since)
        }

        fn cash_flows(&self, since: NaiveDate) -> Result<Vec<TimedRecord<CashFlowStatement>>> {
            self.check(PanelKind::CashFlow)?;
            self.inner.cash_flows(since)
        }
    }

    fn source(price_date: NaiveDate, filed: NaiveDate) -> MemorySource {
        MemorySource {
            prices: vec![TimedRecord::new(price_date, "A", PriceRecord::default())],
            balance_sheets: vec![TimedRecord::new(filed, "A", BalanceSheet::default())],
            income_statements: vec![TimedRecord::new(filed, "A", IncomeStatement::default())],
            ..Default::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn windows() -> RefreshWindows {
        RefreshWindows {
            reference_date: Some(date(2024, 6, 30)),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(PanelKind::Prices, date(2024, 6, 20))]
    #[case(PanelKind::Valuations, date(2024, 6, 20))]
    #[case(PanelKind::BalanceSheet, date(2019, 6, 30))]
    #[case(PanelKind::CashFlow, date(2019, 6, 30))]
    #[case(PanelKind::Revenue, date(2019, 1, 30))]
    fn test_default_windows(#[case] kind: PanelKind, #[case] expected: NaiveDate) {
        assert_eq!(windows().since(kind), expected);
    }

    #[test]
    fn test_unrefreshed_panels_are_missing() {
        let store = PanelStore::new();
        assert!(matches!(
            store.prices(),
            Err(DataError::MissingPanel(PanelKind::Prices))
        ));
        assert!(matches!(
            store.income_statements(),
            Err(DataError::MissingPanel(PanelKind::IncomeStatement))
        ));
        assert!(matches!(
            store.securities(),
            Err(DataError::MissingPanel(PanelKind::Securities))
        ));
        assert!(store.bounds(PanelKind::Prices).is_none());
    }

    #[test]
    fn test_refresh_replaces_panel() {
        let mut source = MemorySource {
            prices: vec![
                TimedRecord::new(date(2024, 6, 27), "A", PriceRecord::default()),
                TimedRecord::new(date(2024, 6, 28), "A", PriceRecord::default()),
            ],
            ..Default::default()
        };
        let mut store = PanelStore::with_windows(windows());
        store.refresh_prices(&source, None).unwrap();
        assert_eq!(store.prices().unwrap().len(), 2);
        assert_eq!(store.bounds(PanelKind::Prices).unwrap().max, date(2024, 6, 28));

        source.prices.truncate(1);
        store.refresh_prices(&source, None).unwrap();
        assert_eq!(store.prices().unwrap().len(), 1);
        assert_eq!(store.bounds(PanelKind::Prices).unwrap().max, date(2024, 6, 27));
    }

    #[test]
    fn test_explicit_since_overrides_window() {
        let source = MemorySource {
            prices: vec![
                TimedRecord::new(date(2024, 1, 2), "A", PriceRecord::default()),
                TimedRecord::new(date(2024, 6, 28), "A", PriceRecord::default()),
            ],
            ..Default::default()
        };
        let mut store = PanelStore::with_windows(windows());
        store.refresh_prices(&source, None).unwrap();
        assert_eq!(store.prices().unwrap().len(), 1);

        store.refresh_prices(&source, Some(date(2024, 1, 1))).unwrap();
        assert_eq!(store.prices().unwrap().len(), 2);
        assert_eq!(store.bounds(PanelKind::Prices).unwrap().min, date(2024, 1, 2));
    }

    #[test]
    fn test_empty_refresh_reports_empty_panel() {
        let mut store = PanelStore::with_windows(windows());
        store.refresh_all(&MemorySource::default()).unwrap();
        assert!(store.prices().unwrap().is_empty());
        assert!(matches!(
            store.latest_prices(),
            Err(DataError::EmptyPanel(PanelKind::Prices))
        ));
        assert!(matches!(
            store.latest_statement_date(),
            Err(DataError::EmptyPanel(PanelKind::BalanceSheet))
        ));
    }

    #[test]
    fn test_failed_refresh_all_keeps_previous_panels() {
        let mut store = PanelStore::with_windows(windows());
        store
            .refresh_all(&source(date(2024, 6, 20), date(2024, 5, 15)))
            .unwrap();

        // Prices and valuations would load before revenue fails
        let failing = FailingSource {
            inner: source(date(2024, 6, 28), date(2024, 5, 15)),
            failing: PanelKind::Revenue,
        };
        let err = store.refresh_all(&failing).unwrap_err();
        assert!(matches!(err, DataError::Source(_)));

        let prices = store.bounds(PanelKind::Prices).unwrap();
        assert_eq!(prices.max, date(2024, 6, 20));
        assert!(store.revenue().unwrap().is_empty());
        assert_eq!(store.windows(), &windows());
    }

    #[test]
    fn test_failed_statement_refresh_keeps_previous_statements() {
        let mut store = PanelStore::with_windows(windows());
        store
            .refresh_statements(&source(date(2024, 6, 20), date(2024, 3, 31)), None)
            .unwrap();

        // Income, cumulative income and balance load before cash flows fail
        let failing = FailingSource {
            inner: source(date(2024, 6, 20), date(2024, 5, 15)),
            failing: PanelKind::CashFlow,
        };
        assert!(store.refresh_statements(&failing, None).is_err());

        assert_eq!(store.latest_statement_date().unwrap(), date(2024, 3, 31));
        let income = store.bounds(PanelKind::IncomeStatement).unwrap();
        assert_eq!(income.max, date(2024, 3, 31));
        assert!(store.cash_flows().unwrap().is_empty());
    }
}
