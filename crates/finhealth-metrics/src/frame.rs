//! DataFrame conversion.
//!
//! Frames joined on quarter carry an integer `quarter` key next to `code`.
//! Missing and non-finite values are nulls inside a frame and NaN once read
//! back into typed rows.

use crate::{
    calendar::FiscalQuarter,
    columns::{Cell, ColumnInfo},
    error::Result,
    features::FeatureRow,
    profitability::{ProfitMetric, ProfitabilityRecord},
};
use finhealth_data::SecurityCode;
use polars::prelude::*;

/// Security code column.
pub(crate) const CODE: &str = "code";
/// Quarter key column.
pub(crate) const QUARTER: &str = "quarter";

pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

pub(crate) fn codes(df: &DataFrame) -> Result<Vec<SecurityCode>> {
    Ok(df
        .column(CODE)?
        .str()?
        .into_iter()
        .map(|code| SecurityCode::from(code.unwrap_or_default()))
        .collect())
}

pub(crate) fn quarters(df: &DataFrame, name: &str) -> Result<Vec<Option<FiscalQuarter>>> {
    Ok(df
        .column(name)?
        .i64()?
        .into_iter()
        .map(|key| key.map(FiscalQuarter::from_key))
        .collect())
}

pub(crate) fn numbers(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(df
        .column(name)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// One column per [`ProfitMetric`].
pub(crate) fn metric_columns(rows: &[&ProfitabilityRecord]) -> Vec<Column> {
    ProfitMetric::ALL
        .iter()
        .map(|&metric| {
            let values: Vec<Option<f64>> =
                rows.iter().map(|row| finite(Some(row.get(metric)))).collect();
            Column::new(metric.name().into(), values)
        })
        .collect()
}

/// Convert feature rows to a DataFrame with one column per catalog entry.
///
/// Missing and non-finite values become nulls.
pub fn features_to_frame(rows: &[FeatureRow], columns: &[ColumnInfo]) -> Result<DataFrame> {
    let mut frame_columns = Vec::with_capacity(columns.len());
    for info in columns {
        let cells = rows.iter().map(|row| info.value.read(row));
        let name = PlSmallStr::from(info.label.as_str());
        let column = if info.value.is_text() {
            let values: Vec<Option<String>> = cells
                .map(|cell| match cell {
                    Cell::Text(v) => v,
                    _ => None,
                })
                .collect();
            Column::new(name, values)
        } else if info.value.is_integer() {
            let values: Vec<Option<i64>> = cells
                .map(|cell| match cell {
                    Cell::Integer(v) => v,
                    _ => None,
                })
                .collect();
            Column::new(name, values)
        } else {
            let values: Vec<Option<f64>> = cells
                .map(|cell| match cell {
                    Cell::Number(v) => v,
                    _ => None,
                })
                .collect();
            Column::new(name, values)
        };
        frame_columns.push(column);
    }

    let df = DataFrame::new(frame_columns)?;
    tracing::debug!(rows = df.height(), columns = df.width(), "exported feature frame");
    Ok(df)
}

/// Convert a profitability history to a DataFrame, one row per quarter,
/// labelled like `2024Q1`.
pub fn profitability_to_frame(rows: &[&ProfitabilityRecord]) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new(
            QUARTER.into(),
            rows.iter().map(|r| r.quarter.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            CODE.into(),
            rows.iter().map(|r| r.code.to_string()).collect::<Vec<_>>(),
        ),
    ];
    columns.extend(metric_columns(rows));
    Ok(DataFrame::new(columns)?)
}
