//! CSV directory source.
//!
//! One file per panel, named after [`PanelKind::file_stem`] (`prices.csv`,
//! `income.csv`, ...), with a header row following the panel's column
//! contract. Empty cells are missing values.

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
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

/// Source reading one CSV file per panel from a directory.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    /// Create a source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the files are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a panel's file.
    pub fn path(&self, kind: PanelKind) -> PathBuf {
        self.dir.join(format!("{}.csv", kind.file_stem()))
    }

    fn open(&self, kind: PanelKind) -> Result<File> {
        let path = self.path(kind);
        File::open(&path).map_err(|e| {
            DataError::Source(format!("cannot open {} for {kind} panel: {e}", path.display()))
        })
    }

    fn records<T: PanelRecord>(
        &self,
        kind: PanelKind,
        since: NaiveDate,
    ) -> Result<Vec<TimedRecord<T>>> {
        read_records(kind, self.open(kind)?, since)
    }
}

fn parse_value(panel: PanelKind, column: &str, raw: &str) -> Result<Option<f64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.replace(',', "")
        .parse::<f64>()
        .map(Some)
        .map_err(|e| DataError::Parse(format!("{panel} column '{column}': '{raw}': {e}")))
}

/// Read timed records dated on or after `since` from CSV text.
pub fn read_records<T: PanelRecord, R: Read>(
    panel: PanelKind,
    reader: R,
    since: NaiveDate,
) -> Result<Vec<TimedRecord<T>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let index = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn {
                panel,
                column: name.to_string(),
            })
    };

    let date_idx = index("date")?;
    let code_idx = index("code")?;
    let value_idx = T::COLUMNS
        .iter()
        .map(|name| index(name))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::new();
    let mut values = vec![None; T::COLUMNS.len()];
    for row in rdr.records() {
        let row = row?;
        let date = parse_date(row.get(date_idx).unwrap_or_default())?;
        if date < since {
            continue;
        }
        let code = row.get(code_idx).unwrap_or_default();
        if code.is_empty() {
            return Err(DataError::Parse(format!("empty code in {panel} row dated {date}")));
        }
        for ((slot, &idx), name) in values.iter_mut().zip(&value_idx).zip(T::COLUMNS) {
            *slot = parse_value(panel, name, row.get(idx).unwrap_or_default())?;
        }
        records.push(TimedRecord::new(date, code, T::from_values(&values)));
    }
    Ok(records)
}

/// Read securities from CSV text with `code`, `name` and `group` headers.
pub fn read_securities<R: Read>(reader: R) -> Result<Vec<Security>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.deserialize()
        .map(|row| row.map_err(DataError::from))
        .collect()
}

impl PanelSource for CsvDirSource {
    fn securities(&self) -> Result<Vec<Security>> {
        read_securities(self.open(PanelKind::Securities)?)
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
