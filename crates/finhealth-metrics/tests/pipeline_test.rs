//! Integration tests from panel refresh to composed feature rows.

use approx::assert_relative_eq;
use chrono::{Months, NaiveDate};
use finhealth_data::{
    BalanceSheet, IncomeStatement, MemorySource, PanelStore, PriceRecord, RefreshWindows,
    RevenueRecord, Security, TimedRecord, ValuationRecord,
};
use finhealth_metrics::{
    FeatureBuilder, FiscalQuarter, ProfitabilityTable, QuarterOffset, build_features, compose,
    derive_from_store, trailing_profiles,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn q(year: i32, quarter: u8) -> FiscalQuarter {
    FiscalQuarter::new(year, quarter).unwrap()
}

// (quarter, basic EPS, net income), latest first
fn history() -> Vec<(FiscalQuarter, f64, f64)> {
    vec![
        (q(2024, 1), 2.0, 200.0),
        (q(2023, 4), 1.5, 150.0),
        (q(2023, 3), 1.0, 100.0),
        (q(2023, 2), 0.5, 50.0),
        (q(2023, 1), 3.0, 300.0),
    ]
}

fn fixture() -> MemorySource {
    let mut source = MemorySource {
        securities: vec![
            Security::new("A", "Alpha", "Semiconductors"),
            Security::new("B", "Beta", "Cement"),
            Security::new("D", "Delta", "Food"),
        ],
        ..Default::default()
    };

    for (code, close) in [("A", 50.0), ("B", 20.0), ("X", 5.0)] {
        for day in [27, 28] {
            source.prices.push(TimedRecord::new(
                date(2024, 6, day),
                code,
                PriceRecord {
                    close: Some(close),
                    change_pct: Some(1.0),
                },
            ));
        }
    }
    for code in ["A", "B", "C"] {
        source.valuations.push(TimedRecord::new(
            date(2024, 6, 28),
            code,
            ValuationRecord {
                dividend_yield_pct: Some(3.2),
                dividend_year: Some(2023),
                pe_ratio: Some(14.0),
                pb_ratio: Some(2.1),
            },
        ));
    }

    for (quarter, eps, net) in history() {
        let filed = quarter.anchor();
        source.income_statements.push(TimedRecord::new(
            filed,
            "A",
            IncomeStatement {
                basic_eps: Some(eps),
                non_operating_income: Some(net / 10.0),
                gross_profit: Some(400.0),
                net_income: Some(net),
                operating_revenue: Some(1000.0),
                ..Default::default()
            },
        ));
        source.balance_sheets.push(TimedRecord::new(
            filed,
            "A",
            BalanceSheet {
                common_stock_capital: Some(1000.0),
                total_assets: Some(4000.0),
                total_equity: Some(2000.0),
                total_liabilities: Some(2000.0),
            },
        ));

        // Each month's revenue is reported on the 10th of the following month
        let mut month = quarter.first_day();
        while quarter.contains(month) {
            let reported = month.checked_add_months(Months::new(1)).unwrap() + chrono::Days::new(9);
            source.revenue.push(TimedRecord::new(
                reported,
                "A",
                RevenueRecord {
                    monthly_revenue: Some(330.0),
                    ..Default::default()
                },
            ));
            month = month.checked_add_months(Months::new(1)).unwrap();
        }
    }
    source
}

fn store() -> PanelStore {
    let mut store = PanelStore::with_windows(RefreshWindows {
        reference_date: Some(date(2024, 6, 30)),
        ..Default::default()
    });
    store.refresh_all(&fixture()).unwrap();
    store
}

#[test]
fn test_store_to_composed_features() {
    let store = store();
    let profitability = derive_from_store(&store).unwrap();
    assert_eq!(profitability.len(), 5);
    let latest = profitability.get(q(2024, 1), &"A".into()).unwrap();
    assert_eq!(latest.revenue.months, 3);
    assert_relative_eq!(latest.revenue.sum, 990.0);
    assert_relative_eq!(latest.gross_margin_pct, 40.0);

    let rows = FeatureBuilder::default()
        .build_from_store(&store, &profitability)
        .unwrap();
    let codes: Vec<_> = rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["A", "B", "C"]);

    let a = &rows[0];
    assert_eq!(a.quarter, q(2024, 1));
    assert!(QuarterOffset::all().all(|o| a.at(o).is_some()));
    assert_relative_eq!(a.eps.sum, 5.0);
    assert_relative_eq!(a.eps.mean, 1.25);
    assert_relative_eq!(a.eps(QuarterOffset::MAX), 3.0);
    assert_relative_eq!(a.custom_eps, 2.0);
    assert_relative_eq!(a.custom_pe, 6.25);
    assert_relative_eq!(a.non_operating_pct[0], 10.0);
    assert_relative_eq!(a.deltas.gross_margin_pct, 0.0);

    let composed = compose(rows, &store.latest_prices().unwrap(), store.securities().unwrap());
    let codes: Vec<_> = composed.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["A", "B", "C"]);
    assert_eq!(composed[0].security.as_ref().unwrap().name, "Alpha");
    assert_eq!(composed[1].close(), 20.0);
    assert!(composed[2].security.is_none());
    assert!(composed[2].price.is_none());

    let profiles = trailing_profiles(&composed);
    assert_relative_eq!(profiles[0].eps_total, 5.0);
    assert!(profiles[1].eps_total.is_nan());
}

#[test]
fn test_empty_history_keeps_multiples() {
    let store = store();
    let rows = build_features(
        &store.latest_valuations().unwrap(),
        &ProfitabilityTable::default(),
        &store.latest_prices().unwrap(),
        q(2024, 1),
    )
    .unwrap();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert!(row.eps.sum.is_nan());
        assert!(row.eps.mean.is_nan());
        assert!(row.eps.std.is_nan());
        assert!(row.custom_eps.is_nan());
        assert_eq!(row.valuation.pe_ratio, Some(14.0));
    }
    assert_eq!(rows[0].close(), 50.0);
}

#[test]
fn test_derivation_is_repeatable() {
    let run = || {
        let store = store();
        let profitability = derive_from_store(&store).unwrap();
        let rows = FeatureBuilder::default()
            .build_from_store(&store, &profitability)
            .unwrap();
        format!("{:?}", compose(rows, &store.latest_prices().unwrap(), store.securities().unwrap()))
    };
    assert_eq!(run(), run());
}

#[test]
fn test_derivation_before_refresh_fails() {
    let store = PanelStore::new();
    assert!(derive_from_store(&store).is_err());
    assert!(
        FeatureBuilder::default()
            .build_from_store(&store, &ProfitabilityTable::default())
            .is_err()
    );
}
