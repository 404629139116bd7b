//! Time-indexed panels keyed by `(date, security code)`.

use crate::{record::TimedRecord, security::SecurityCode};
use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Panels held by the [`PanelStore`](crate::PanelStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum PanelKind {
    /// Static security attributes
    #[display("securities")]
    Securities,
    /// Daily trading prices
    #[display("prices")]
    Prices,
    /// Daily valuation multiples
    #[display("valuations")]
    Valuations,
    /// Monthly revenue
    #[display("revenue")]
    Revenue,
    /// Quarterly income statements
    #[display("income statement")]
    IncomeStatement,
    /// Quarterly cumulative (year-to-date) income statements
    #[display("cumulative income statement")]
    CumulativeIncomeStatement,
    /// Quarterly balance sheets
    #[display("balance sheet")]
    BalanceSheet,
    /// Quarterly cash flow statements
    #[display("cash flow")]
    CashFlow,
}

impl PanelKind {
    /// All timed panels, in refresh order.
    pub const TIMED: [Self; 7] = [
        Self::Prices,
        Self::Valuations,
        Self::Revenue,
        Self::IncomeStatement,
        Self::CumulativeIncomeStatement,
        Self::BalanceSheet,
        Self::CashFlow,
    ];

    /// File stem used by file-based adapters.
    pub const fn file_stem(&self) -> &'static str {
        match self {
            Self::Securities => "securities",
            Self::Prices => "prices",
            Self::Valuations => "valuations",
            Self::Revenue => "revenue",
            Self::IncomeStatement => "income",
            Self::CumulativeIncomeStatement => "cumulative_income",
            Self::BalanceSheet => "balance",
            Self::CashFlow => "cash_flow",
        }
    }
}

/// Observed date range of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelBounds {
    /// Earliest record date
    pub min: NaiveDate,
    /// Latest record date
    pub max: NaiveDate,
}

/// Rows of one panel sharing a single date, keyed by security.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Date of the snapshot
    pub date: NaiveDate,
    /// Rows by security code
    pub rows: BTreeMap<SecurityCode, T>,
}

impl<T> Snapshot<T> {
    /// Row for a security, if present.
    pub fn get(&self, code: &SecurityCode) -> Option<&T> {
        self.rows.get(code)
    }

    /// Number of securities in the snapshot.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A set of records of one kind, unique by `(date, code)`.
#[derive(Debug, Clone)]
pub struct Panel<T> {
    kind: PanelKind,
    records: BTreeMap<(NaiveDate, SecurityCode), T>,
    bounds: Option<PanelBounds>,
}

impl<T> Panel<T> {
    /// Build a panel, keeping the last record seen for a duplicated key.
    pub fn from_records(
        kind: PanelKind,
        records: impl IntoIterator<Item = TimedRecord<T>>,
    ) -> Self {
        let mut map = BTreeMap::new();
        let mut duplicates = 0usize;
        for record in records {
            if map.insert((record.date, record.code), record.values).is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            tracing::warn!(panel = %kind, duplicates, "replaced records with duplicated keys");
        }

        let bounds = match (map.keys().next(), map.keys().next_back()) {
            (Some((min, _)), Some((max, _))) => Some(PanelBounds {
                min: *min,
                max: *max,
            }),
            _ => None,
        };

        Self {
            kind,
            records: map,
            bounds,
        }
    }

    /// Which panel this is.
    pub const fn kind(&self) -> PanelKind {
        self.kind
    }

    /// Observed min/max date, `None` for an empty panel.
    pub const fn bounds(&self) -> Option<PanelBounds> {
        self.bounds
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the panel holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for a key.
    pub fn get(&self, date: NaiveDate, code: &SecurityCode) -> Option<&T> {
        self.records.get(&(date, code.clone()))
    }

    /// All records ordered by `(date, code)`.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &SecurityCode, &T)> {
        self.records
            .iter()
            .map(|((date, code), values)| (*date, code, values))
    }

    /// Records dated exactly `date`.
    pub fn on(&self, date: NaiveDate) -> impl Iterator<Item = (&SecurityCode, &T)> {
        self.records
            .range((date, SecurityCode::default())..)
            .take_while(move |((d, _), _)| *d == date)
            .map(|((_, code), values)| (code, values))
    }
}

impl<T: Clone> Panel<T> {
    /// Snapshot of the records at `date`.
    pub fn snapshot_at(&self, date: NaiveDate) -> Snapshot<T> {
        Snapshot {
            date,
            rows: self
                .on(date)
                .map(|(code, values)| (code.clone(), values.clone()))
                .collect(),
        }
    }

    /// Snapshot of the records at the panel's max date.
    pub fn latest(&self) -> Option<Snapshot<T>> {
        self.bounds.map(|bounds| self.snapshot_at(bounds.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PriceRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn price(close: f64) -> PriceRecord {
        PriceRecord {
            close: Some(close),
            change_pct: None,
        }
    }

    #[test]
    fn test_bounds_and_latest() {
        let panel = Panel::from_records(
            PanelKind::Prices,
            vec![
                TimedRecord::new(date(2024, 3, 4), "2330", price(700.0)),
                TimedRecord::new(date(2024, 3, 1), "2330", price(690.0)),
                TimedRecord::new(date(2024, 3, 4), "1101", price(33.0)),
            ],
        );

        let bounds = panel.bounds().unwrap();
        assert_eq!(bounds.min, date(2024, 3, 1));
        assert_eq!(bounds.max, date(2024, 3, 4));

        let latest = panel.latest().unwrap();
        assert_eq!(latest.date, date(2024, 3, 4));
        assert_eq!(latest.len(), 2);
        assert_eq!(latest.get(&"2330".into()).unwrap().close, Some(700.0));
    }

    #[test]
    fn test_duplicate_key_keeps_last() {
        let panel = Panel::from_records(
            PanelKind::Prices,
            vec![
                TimedRecord::new(date(2024, 3, 4), "2330", price(700.0)),
                TimedRecord::new(date(2024, 3, 4), "2330", price(705.0)),
            ],
        );
        assert_eq!(panel.len(), 1);
        assert_eq!(
            panel.get(date(2024, 3, 4), &"2330".into()).unwrap().close,
            Some(705.0)
        );
    }

    #[test]
    fn test_empty_panel_has_no_latest() {
        let panel: Panel<PriceRecord> = Panel::from_records(PanelKind::Prices, Vec::new());
        assert!(panel.is_empty());
        assert!(panel.bounds().is_none());
        assert!(panel.latest().is_none());
    }

    #[test]
    fn test_on_excludes_neighbouring_dates() {
        let panel = Panel::from_records(
            PanelKind::Prices,
            vec![
                TimedRecord::new(date(2024, 3, 1), "9999", price(1.0)),
                TimedRecord::new(date(2024, 3, 2), "0001", price(2.0)),
                TimedRecord::new(date(2024, 3, 3), "0001", price(3.0)),
            ],
        );
        let rows: Vec<_> = panel.on(date(2024, 3, 2)).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.close, Some(2.0));
    }
}
