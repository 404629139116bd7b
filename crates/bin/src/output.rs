//! Table rendering for the CLI.

use clap::ValueEnum;
use finhealth::metrics::{
    Cell, ColumnInfo, FeatureRow, ProfitMetric, ProfitabilityRecord, TrailingProfile,
};
use serde_json::{Map, Value};
use std::io::Write;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// Aligned text table
    Text,
    /// Pretty-printed JSON
    Json,
    /// CSV with a header row
    Csv,
}

/// Header labels plus rows of cells.
#[derive(Debug)]
pub(crate) struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

fn number(value: f64) -> Cell {
    Cell::Number(value.is_finite().then_some(value))
}

fn optional(value: Option<f64>) -> Cell {
    Cell::Number(value.filter(|v| v.is_finite()))
}

fn json(cell: &Cell) -> Value {
    match cell {
        Cell::Text(Some(s)) => Value::from(s.as_str()),
        Cell::Integer(Some(i)) => Value::from(*i),
        Cell::Number(Some(v)) => Value::from(*v),
        Cell::Text(None) | Cell::Integer(None) | Cell::Number(None) => Value::Null,
    }
}

fn render(cell: &Cell, missing: &str) -> String {
    match cell {
        Cell::Text(Some(s)) => s.clone(),
        Cell::Integer(Some(i)) => i.to_string(),
        Cell::Number(Some(v)) => format!("{v:.2}"),
        Cell::Text(None) | Cell::Integer(None) | Cell::Number(None) => missing.to_string(),
    }
}

impl Table {
    /// Feature rows projected onto catalog columns.
    pub(crate) fn features(rows: &[FeatureRow], columns: &[ColumnInfo]) -> Self {
        Self {
            headers: columns.iter().map(|c| c.label.clone()).collect(),
            rows: rows
                .iter()
                .map(|row| columns.iter().map(|c| c.value.read(row)).collect())
                .collect(),
        }
    }

    /// One security's profitability history.
    pub(crate) fn profitability(history: &[&ProfitabilityRecord]) -> Self {
        const METRICS: [ProfitMetric; 9] = [
            ProfitMetric::BasicEps,
            ProfitMetric::OperatingRevenue,
            ProfitMetric::NetIncome,
            ProfitMetric::RevenueSum,
            ProfitMetric::GrossMarginPct,
            ProfitMetric::NetMarginPct,
            ProfitMetric::RoaPct,
            ProfitMetric::RoePct,
            ProfitMetric::LeveragePct,
        ];
        let mut headers = vec!["quarter".to_string()];
        headers.extend(METRICS.iter().map(|m| m.name().to_string()));
        Self {
            headers,
            rows: history
                .iter()
                .map(|record| {
                    let mut cells = vec![Cell::Text(Some(record.quarter.to_string()))];
                    cells.extend(METRICS.iter().map(|&m| number(record.get(m))));
                    cells
                })
                .collect(),
        }
    }

    /// Trailing four-quarter profiles.
    pub(crate) fn trailing(profiles: &[TrailingProfile]) -> Self {
        let headers = [
            "code",
            "name",
            "quarter",
            "pe_ratio",
            "pb_ratio",
            "dividend_yield_pct",
            "eps_total",
            "gross_margin_pct",
            "net_margin_pct",
            "roa_pct",
            "roe_pct",
            "roa_pct_delta",
            "roe_pct_delta",
        ];
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: profiles
                .iter()
                .map(|p| {
                    vec![
                        Cell::Text(Some(p.code.to_string())),
                        Cell::Text(p.security.as_ref().map(|s| s.name.clone())),
                        Cell::Text(Some(p.quarter.to_string())),
                        optional(p.valuation.pe_ratio),
                        optional(p.valuation.pb_ratio),
                        optional(p.valuation.dividend_yield_pct),
                        number(p.eps_total),
                        number(p.gross_margin_pct),
                        number(p.net_margin_pct),
                        number(p.roa_pct),
                        number(p.roe_pct),
                        number(p.deltas.roa_pct),
                        number(p.deltas.roe_pct),
                    ]
                })
                .collect(),
        }
    }

    /// Write as CSV; missing values are empty fields.
    pub(crate) fn write_csv<W: Write>(&self, out: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| render(cell, "")))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write as a JSON array with one object per row, keyed by header;
    /// missing values are `null`.
    pub(crate) fn write_json<W: Write>(&self, mut out: W) -> Result<(), serde_json::Error> {
        let records: Vec<Map<String, Value>> = self
            .rows
            .iter()
            .map(|row| self.headers.iter().cloned().zip(row.iter().map(json)).collect())
            .collect();
        serde_json::to_writer_pretty(&mut out, &records)?;
        writeln!(out).map_err(serde_json::Error::io)
    }

    /// Write as a right-aligned text table; missing values are `-`.
    pub(crate) fn write_text<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| render(cell, "-")).collect())
            .collect();
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rendered
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect();

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:>width$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };
        let rule = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        writeln!(out, "{}", line(self.headers.as_slice()))?;
        writeln!(out, "{}", "─".repeat(rule))?;
        for row in &rendered {
            writeln!(out, "{}", line(row.as_slice()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table {
            headers: vec!["code".into(), "E(0)".into()],
            rows: vec![
                vec![Cell::Text(Some("2330".into())), Cell::Number(Some(9.126))],
                vec![Cell::Text(Some("1101".into())), Cell::Number(None)],
            ],
        }
    }

    #[test]
    fn test_csv_leaves_missing_empty() {
        let mut out = Vec::new();
        table().write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "code,E(0)\n2330,9.13\n1101,\n");
    }

    #[test]
    fn test_json_keeps_only_table_columns() {
        let mut out = Vec::new();
        table().write_json(&mut out).unwrap();
        let records: Vec<Map<String, Value>> = serde_json::from_slice(&out).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0]["code"], "2330");
        assert_eq!(records[0]["E(0)"], 9.126);
        assert!(records[1]["E(0)"].is_null());
        assert!(!records[0].contains_key("valuation"));
    }

    #[test]
    fn test_text_alignment() {
        let mut out = Vec::new();
        table().write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "code  E(0)");
        assert_eq!(lines[2], "2330  9.13");
        assert_eq!(lines[3], "1101     -");
    }
}
