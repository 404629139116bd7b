//! Integration tests for loading a CSV directory into the panel store.

use chrono::NaiveDate;
use finhealth_data::{CsvDirSource, DataError, PanelKind, PanelStore, RefreshWindows};
use std::{fs, path::PathBuf};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const INCOME_HEADER: &str = "date,code,basic_eps,non_operating_income,gross_profit,gross_profit_net,\
net_income,operating_revenue,pretax_income_continuing,net_income_continuing,net_income_parent,\
continuing_unit_income,discontinued_unit_income";

fn write_panels(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("finhealth-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let files = [
        ("securities.csv", "code,name,group\n2330,TSMC,Semiconductors\n1101,Taiwan Cement,Cement\n".to_string()),
        (
            "prices.csv",
            "date,code,close,change_pct\n\
             2024-06-27,2330,\"1,000.0\",0.5\n\
             2024-06-28,2330,990,-1\n\
             2024-06-28,1101,33.1,\n\
             2024-05-01,2330,800,\n"
                .to_string(),
        ),
        (
            "valuations.csv",
            "date,code,dividend_yield_pct,dividend_year,pe_ratio,pb_ratio\n\
             2024-06-28,2330,1.5,2023,25.1,6.2\n"
                .to_string(),
        ),
        (
            "revenue.csv",
            "date,code,monthly_revenue,yoy_pct,mom_pct\n\
             2024-04-10,2330,195000,34.3,8.4\n"
                .to_string(),
        ),
        (
            "income.csv",
            format!("{INCOME_HEADER}\n2024-05-15,2330,8.7,10,120,120,225,592,,,,,\n"),
        ),
        ("cumulative_income.csv", format!("{INCOME_HEADER}\n")),
        (
            "balance.csv",
            "date,code,common_stock_capital,total_assets,total_equity,total_liabilities\n\
             2024-05-15,2330,259,5800,3700,2100\n\
             2018-05-15,2330,259,2000,1500,500\n"
                .to_string(),
        ),
        (
            "cash_flow.csv",
            "date,code,operating_cash_flow,investing_cash_flow,financing_cash_flow,capital_expenditure\n"
                .to_string(),
        ),
    ];
    for (file, text) in files {
        fs::write(dir.join(file), text).unwrap();
    }
    dir
}

#[test]
fn test_refresh_all_from_csv_directory() {
    let dir = write_panels("refresh");
    let mut store = PanelStore::with_windows(RefreshWindows {
        reference_date: Some(date(2024, 6, 30)),
        ..Default::default()
    });
    store.refresh_all(&CsvDirSource::new(&dir)).unwrap();

    assert_eq!(store.securities().unwrap().len(), 2);

    // The May price is outside the 10-day window
    let prices = store.bounds(PanelKind::Prices).unwrap();
    assert_eq!(prices.min, date(2024, 6, 27));
    assert_eq!(prices.max, date(2024, 6, 28));

    let latest = store.latest_prices().unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest.get(&"2330".into()).unwrap().close, Some(990.0));
    assert_eq!(latest.get(&"1101".into()).unwrap().change_pct, None);

    // The 2018 balance sheet is outside the 5-year window
    let balance = store.bounds(PanelKind::BalanceSheet).unwrap();
    assert_eq!(balance.min, date(2024, 5, 15));
    assert_eq!(store.latest_statement_date().unwrap(), date(2024, 5, 15));

    let income = store.income_statements().unwrap();
    let q1 = income.get(date(2024, 5, 15), &"2330".into()).unwrap();
    assert_eq!(q1.net_income, Some(225.0));
    assert_eq!(q1.net_income_parent, None);

    assert!(store.bounds(PanelKind::CashFlow).is_none());
    assert_eq!(
        store.valuations().unwrap().latest().unwrap().get(&"2330".into()).unwrap().dividend_year,
        Some(2023)
    );

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_missing_file_is_a_source_error() {
    let dir = write_panels("missing");
    fs::remove_file(dir.join("revenue.csv")).unwrap();

    let mut store = PanelStore::new();
    let err = store
        .refresh_revenue(&CsvDirSource::new(&dir), None)
        .unwrap_err();
    assert!(matches!(err, DataError::Source(_)));
    assert!(matches!(store.revenue(), Err(DataError::MissingPanel(PanelKind::Revenue))));

    fs::remove_dir_all(dir).ok();
}
