//! Polars DataFrame source.
//!
//! Each panel is handed over as a DataFrame following the column contract of
//! its [`PanelRecord`] type: `date` (Date or ISO string), `code`, then the
//! numeric columns. Numeric columns are cast to `Float64`; nulls become
//! missing fields. The securities frame carries `code`, `name` and `group`.

use super::{PanelSource, parse_date};
use crate::{
    error::{DataError, Result},
    panel::PanelKind,
    record::{
        BalanceSheet, CashFlowStatement, IncomeStatement, PanelRecord, PriceRecord,
        RevenueRecord, TimedRecord, ValuationRecord,
    },
    security::Security,
};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;

/// Source backed by one DataFrame per panel.
#[derive(Debug, Clone, Default)]
pub struct FrameSource {
    frames: HashMap<PanelKind, DataFrame>,
}

impl FrameSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the frame of a panel.
    pub fn with_frame(mut self, kind: PanelKind, frame: DataFrame) -> Self {
        self.insert(kind, frame);
        self
    }

    /// Add or replace the frame of a panel.
    pub fn insert(&mut self, kind: PanelKind, frame: DataFrame) {
        self.frames.insert(kind, frame);
    }

    fn frame(&self, kind: PanelKind) -> Result<&DataFrame> {
        self.frames
            .get(&kind)
            .ok_or_else(|| DataError::Source(format!("no frame registered for {kind} panel")))
    }

    fn records<T: PanelRecord>(
        &self,
        kind: PanelKind,
        since: NaiveDate,
    ) -> Result<Vec<TimedRecord<T>>> {
        records_from_frame(kind, self.frame(kind)?, since)
    }
}

fn column<'a>(df: &'a DataFrame, panel: PanelKind, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| DataError::MissingColumn {
        panel,
        column: name.to_string(),
    })
}

fn string_column(df: &DataFrame, panel: PanelKind, name: &str) -> Result<Column> {
    Ok(column(df, panel, name)?.cast(&DataType::String)?)
}

/// Convert a DataFrame into timed records dated on or after `since`.
pub fn records_from_frame<T: PanelRecord>(
    panel: PanelKind,
    df: &DataFrame,
    since: NaiveDate,
) -> Result<Vec<TimedRecord<T>>> {
    let codes = string_column(df, panel, "code")?;
    let codes = codes.str()?;
    let dates = string_column(df, panel, "date")?;
    let dates = dates.str()?;

    let mut numeric = Vec::with_capacity(T::COLUMNS.len());
    for name in T::COLUMNS {
        numeric.push(column(df, panel, name)?.cast(&DataType::Float64)?);
    }
    let numeric = numeric
        .iter()
        .map(|c| c.f64())
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut records = Vec::with_capacity(df.height());
    let mut values = vec![None; T::COLUMNS.len()];
    for i in 0..df.height() {
        let code = codes
            .get(i)
            .ok_or_else(|| DataError::Parse(format!("missing code at row {i} of {panel} frame")))?;
        let date = dates
            .get(i)
            .ok_or_else(|| DataError::Parse(format!("missing date at row {i} of {panel} frame")))?;
        let date = parse_date(date)?;
        if date < since {
            continue;
        }
        for (slot, col) in values.iter_mut().zip(&numeric) {
            *slot = col.get(i);
        }
        records.push(TimedRecord::new(date, code, T::from_values(&values)));
    }

    tracing::debug!(panel = %panel, rows = df.height(), kept = records.len(), "converted frame");
    Ok(records)
}

/// Convert a `code`/`name`/`group` DataFrame into securities.
pub fn securities_from_frame(df: &DataFrame) -> Result<Vec<Security>> {
    let panel = PanelKind::Securities;
    let codes = string_column(df, panel, "code")?;
    let names = string_column(df, panel, "name")?;
    let groups = string_column(df, panel, "group")?;
    let (codes, names, groups) = (codes.str()?, names.str()?, groups.str()?);

    (0..df.height())
        .map(|i| {
            let code = codes
                .get(i)
                .ok_or_else(|| {
                    DataError::Parse(format!("missing code at row {i} of securities frame"))
                })?;
            Ok(Security::new(
                code,
                names.get(i).unwrap_or_default(),
                groups.get(i).unwrap_or_default(),
            ))
        })
        .collect()
}

impl PanelSource for FrameSource {
    fn securities(&self) -> Result<Vec<Security>> {
        securities_from_frame(self.frame(PanelKind::Securities)?)
    }

    fn prices(&self, since: NaiveDate) -> Result<Vec<TimedRecord<PriceRecord>>> {
        self.records(PanelKind::Prices, since)
    }

    fn valuations(&self, since: NaiveDate) -> Result<Vec<TimedRecord<ValuationRecord>>> {
        self.records(PanelKind::Valuations, since)
    }

    fn revenue(&self, since: NaiveDate) -> Result<Vec<TimedRecord<RevenueRecord>>> {
        self.records(PanelKind::Revenue, since)
    }

    fn income_statements(&self, since: NaiveDate) -> Result<Vec<TimedRecord<IncomeStatement>>> {
        self.records(PanelKind::IncomeStatement, since)
    }

    fn cumulative_income_statements(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<TimedRecord<IncomeStatement>>> {
        self.records(PanelKind::CumulativeIncomeStatement, since)
    }

    fn balance_sheets(&self, since: NaiveDate) -> Result<Vec<TimedRecord<BalanceSheet>>> {
        self.records(PanelKind::BalanceSheet, since)
    }

    fn cash_flows(&self, since: NaiveDate) -> Result<Vec<TimedRecord<CashFlowStatement>>> {
        self.records(PanelKind::CashFlow, since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_frame() -> DataFrame {
        df!(
            "date" => ["2024-03-01", "2024-03-04", "2024-03-04"],
            "code" => ["2330", "2330", "1101"],
            "close" => [Some(690.0), Some(700.0), None],
            "change_pct" => [0.5, 1.45, -0.3],
        )
        .unwrap()
    }

    #[test]
    fn test_prices_from_frame() {
        let source = FrameSource::new().with_frame(PanelKind::Prices, price_frame());
        let since = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let prices = source.prices(since).unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].code.as_str(), "2330");
        assert_eq!(prices[0].values.close, Some(700.0));
        assert_eq!(prices[1].values.close, None);
        assert_eq!(prices[1].values.change_pct, Some(-0.3));
    }

    #[test]
    fn test_date_typed_column() {
        let df = price_frame()
            .lazy()
            .with_column(col("date").cast(DataType::Date))
            .collect()
            .unwrap();
        let records: Vec<TimedRecord<PriceRecord>> =
            records_from_frame(PanelKind::Prices, &df, NaiveDate::MIN).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_missing_column() {
        let df = df!("date" => ["2024-03-01"], "code" => ["2330"], "close" => [1.0]).unwrap();
        let err = records_from_frame::<PriceRecord>(PanelKind::Prices, &df, NaiveDate::MIN)
            .unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "change_pct"));
    }

    #[test]
    fn test_unregistered_panel() {
        let source = FrameSource::new();
        assert!(matches!(source.securities(), Err(DataError::Source(_))));
    }

    #[test]
    fn test_securities_from_frame() {
        let df = df!(
            "code" => ["2330", "1101"],
            "name" => ["TSMC", "Taiwan Cement"],
            "group" => ["Semiconductors", "Cement"],
        )
        .unwrap();
        let securities = securities_from_frame(&df).unwrap();
        assert_eq!(securities.len(), 2);
        assert_eq!(securities[1].group, "Cement");
    }
}
