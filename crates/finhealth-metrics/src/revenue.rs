//! Revenue aggregation by fiscal quarter.
//!
//! Monthly reports are keyed by the quarter of the month they carry, then
//! grouped by `(quarter, code)`.

use crate::{
    calendar::FiscalQuarter,
    error::Result,
    frame::{CODE, QUARTER, codes, finite, numbers, quarters},
    profitability::ProfitMetric,
};
use finhealth_data::{Panel, RevenueRecord, SecurityCode};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MONTHLY_REVENUE: &str = "monthly_revenue";

/// Monthly revenue reduced over one fiscal quarter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueAggregate {
    /// Total revenue of the reported months
    pub sum: f64,
    /// Average monthly revenue
    pub average: f64,
    /// Number of months reported
    pub months: usize,
}

/// Aggregated revenue keyed by `(quarter, security)`.
///
/// A key is present only if at least one month was reported for it.
pub type RevenueBuckets = BTreeMap<(FiscalQuarter, SecurityCode), RevenueAggregate>;

/// Monthly revenue grouped into fiscal quarters, as a lazy frame with
/// `quarter`, `code`, `revenue_sum`, `revenue_average` and `revenue_months`.
///
/// Each report is shifted back one calendar month before its quarter is
/// resolved (a report dated 2023-06-10 is May's revenue). Reports without a
/// revenue figure do not count towards their bucket.
pub fn aggregate_revenue_frame(panel: &Panel<RevenueRecord>) -> Result<LazyFrame> {
    let mut code_column = Vec::with_capacity(panel.len());
    let mut quarter_column = Vec::with_capacity(panel.len());
    let mut revenue_column = Vec::with_capacity(panel.len());
    for (date, code, record) in panel.iter() {
        code_column.push(code.as_str());
        quarter_column.push(FiscalQuarter::quarter_of(date).key());
        revenue_column.push(finite(record.monthly_revenue));
    }
    let monthly = DataFrame::new(vec![
        Column::new(CODE.into(), code_column),
        Column::new(QUARTER.into(), quarter_column),
        Column::new(MONTHLY_REVENUE.into(), revenue_column),
    ])?;

    Ok(monthly
        .lazy()
        .filter(col(MONTHLY_REVENUE).is_not_null())
        .group_by([col(QUARTER), col(CODE)])
        .agg([
            col(MONTHLY_REVENUE)
                .sum()
                .alias(ProfitMetric::RevenueSum.name()),
            col(MONTHLY_REVENUE)
                .mean()
                .alias(ProfitMetric::RevenueAverage.name()),
            col(MONTHLY_REVENUE)
                .count()
                .cast(DataType::Float64)
                .alias(ProfitMetric::RevenueMonths.name()),
        ]))
}

/// Bucket monthly revenue reports into fiscal quarters.
pub fn aggregate_revenue(panel: &Panel<RevenueRecord>) -> Result<RevenueBuckets> {
    let df = aggregate_revenue_frame(panel)?.collect()?;
    let sums = numbers(&df, ProfitMetric::RevenueSum.name())?;
    let averages = numbers(&df, ProfitMetric::RevenueAverage.name())?;
    let months = numbers(&df, ProfitMetric::RevenueMonths.name())?;

    let buckets: RevenueBuckets = codes(&df)?
        .into_iter()
        .zip(quarters(&df, QUARTER)?)
        .enumerate()
        .filter_map(|(i, (code, quarter))| {
            let aggregate = RevenueAggregate {
                sum: sums[i],
                average: averages[i],
                months: months[i] as usize,
            };
            Some(((quarter?, code), aggregate))
        })
        .collect();

    tracing::debug!(records = panel.len(), buckets = buckets.len(), "aggregated revenue");
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use finhealth_data::{PanelKind, TimedRecord};

    fn report(
        y: i32,
        m: u32,
        d: u32,
        code: &str,
        revenue: Option<f64>,
    ) -> TimedRecord<RevenueRecord> {
        TimedRecord::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            code,
            RevenueRecord {
                monthly_revenue: revenue,
                ..Default::default()
            },
        )
    }

    fn q(year: i32, quarter: u8) -> FiscalQuarter {
        FiscalQuarter::new(year, quarter).unwrap()
    }

    #[test]
    fn test_reports_shift_back_one_month() {
        // March, April and May revenue
        let panel = Panel::from_records(
            PanelKind::Revenue,
            vec![
                report(2023, 4, 10, "A", Some(10.0)),
                report(2023, 5, 10, "A", Some(20.0)),
                report(2023, 6, 10, "A", Some(30.0)),
            ],
        );
        let buckets = aggregate_revenue(&panel).unwrap();

        let q1 = buckets[&(q(2023, 1), "A".into())];
        assert_relative_eq!(q1.sum, 10.0);
        assert_eq!(q1.months, 1);

        let q2 = buckets[&(q(2023, 2), "A".into())];
        assert_relative_eq!(q2.sum, 50.0);
        assert_relative_eq!(q2.average, 25.0);
        assert_eq!(q2.months, 2);
    }

    #[test]
    fn test_full_quarter_bucket() {
        // January, February and March revenue
        let panel = Panel::from_records(
            PanelKind::Revenue,
            vec![
                report(2023, 2, 10, "A", Some(10.0)),
                report(2023, 3, 10, "A", Some(20.0)),
                report(2023, 4, 10, "A", Some(30.0)),
                report(2023, 4, 10, "B", Some(7.0)),
            ],
        );
        let buckets = aggregate_revenue(&panel).unwrap();
        assert_eq!(buckets.len(), 2);

        let a = buckets[&(q(2023, 1), "A".into())];
        assert_relative_eq!(a.sum, 60.0);
        assert_relative_eq!(a.average, 20.0);
        assert_eq!(a.months, 3);
    }

    #[test]
    fn test_non_finite_revenue_is_missing() {
        let panel = Panel::from_records(
            PanelKind::Revenue,
            vec![
                report(2023, 5, 10, "A", Some(f64::NAN)),
                report(2023, 6, 10, "A", Some(8.0)),
            ],
        );
        let q2 = aggregate_revenue(&panel).unwrap()[&(q(2023, 2), "A".into())];
        assert_relative_eq!(q2.sum, 8.0);
        assert_eq!(q2.months, 1);
    }

    #[test]
    fn test_empty_panel() {
        let panel = Panel::from_records(PanelKind::Revenue, Vec::new());
        assert!(aggregate_revenue(&panel).unwrap().is_empty());
        let df = aggregate_revenue_frame(&panel).unwrap().collect().unwrap();
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn test_missing_revenue_is_absent_not_zero() {
        let panel = Panel::from_records(
            PanelKind::Revenue,
            vec![
                report(2023, 2, 10, "A", None),
                report(2023, 5, 10, "A", Some(5.0)),
            ],
        );
        let buckets = aggregate_revenue(&panel).unwrap();
        assert!(!buckets.contains_key(&(q(2023, 1), "A".into())));
        assert_eq!(buckets[&(q(2023, 2), "A".into())].months, 1);
    }
}
