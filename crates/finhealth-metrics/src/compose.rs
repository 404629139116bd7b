//! Snapshot composition.

use crate::features::FeatureRow;
use finhealth_data::{PriceRecord, Security, SecurityCode, Snapshot};
use std::collections::BTreeMap;

/// Attach security attributes and latest prices to feature rows.
///
/// Every feature row is kept. Securities and prices without a feature row are
/// dropped; a feature row without a matching security or price gets none.
pub fn compose(
    rows: Vec<FeatureRow>,
    prices: &Snapshot<PriceRecord>,
    securities: &BTreeMap<SecurityCode, Security>,
) -> Vec<FeatureRow> {
    let rows: Vec<FeatureRow> = rows
        .into_iter()
        .map(|mut row| {
            row.security = securities.get(&row.code).cloned();
            row.price = prices.get(&row.code).cloned();
            row
        })
        .collect();

    let unmatched = rows.iter().filter(|row| row.security.is_none()).count();
    tracing::debug!(rows = rows.len(), unmatched, "composed feature rows");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calendar::FiscalQuarter,
        features::build_features,
        profitability::ProfitabilityTable,
    };
    use chrono::NaiveDate;
    use finhealth_data::ValuationRecord;

    fn snapshot<T>(rows: Vec<(&str, T)>) -> Snapshot<T> {
        Snapshot {
            date: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            rows: rows
                .into_iter()
                .map(|(c, v)| (SecurityCode::from(c), v))
                .collect(),
        }
    }

    #[test]
    fn test_feature_rows_drive_the_join() {
        let valuations = snapshot(vec![
            ("A", ValuationRecord::default()),
            ("B", ValuationRecord::default()),
        ]);
        let prices = snapshot(vec![
            ("A", PriceRecord { close: Some(10.0), change_pct: None }),
            ("C", PriceRecord { close: Some(30.0), change_pct: None }),
        ]);
        let securities: BTreeMap<_, _> = [
            Security::new("B", "Beta", "Cement"),
            Security::new("D", "Delta", "Food"),
        ]
        .into_iter()
        .map(|s| (s.code.clone(), s))
        .collect();

        let quarter = FiscalQuarter::new(2024, 1).unwrap();
        let rows =
            build_features(&valuations, &ProfitabilityTable::default(), &prices, quarter).unwrap();
        let composed = compose(rows, &prices, &securities);

        let codes: Vec<_> = composed.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert!(composed[0].security.is_none());
        assert_eq!(composed[0].close(), 10.0);
        assert_eq!(composed[1].security.as_ref().unwrap().name, "Beta");
        assert!(composed[1].price.is_none());
    }
}
