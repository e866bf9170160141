// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::aggregation::Amounts;
use super::rows::InvestmentRow;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Totals for one (year, month), with gross-balance change since the
/// previous point in the series.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodPoint {
    pub year: i32,
    pub month: u32,
    pub amounts: Amounts,
    pub change: Option<Decimal>,
}

/// Chronological per-period totals for charting.
pub fn monthly_series(rows: &[InvestmentRow]) -> Vec<PeriodPoint> {
    let mut by_period: BTreeMap<(i32, u32), Amounts> = BTreeMap::new();
    for row in rows {
        *by_period.entry((row.year, row.month)).or_default() += row.amounts;
    }

    let mut points = Vec::with_capacity(by_period.len());
    let mut prev_gross: Option<i64> = None;
    for ((year, month), amounts) in by_period {
        let change = prev_gross
            .filter(|p| *p != 0)
            .and_then(|p| Decimal::from(amounts.gross_balance - p).checked_div(Decimal::from(p)));
        prev_gross = Some(amounts.gross_balance);
        points.push(PeriodPoint {
            year,
            month,
            amounts,
            change,
        });
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(year: i32, month: u32, gross: i64) -> InvestmentRow {
        InvestmentRow {
            id: 0,
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            year,
            month,
            client: "Ana".into(),
            bank: "Itau".into(),
            asset: "CDB".into(),
            asset_type: None,
            category: None,
            amounts: Amounts {
                gross_balance: gross,
                ..Amounts::default()
            },
        }
    }

    #[test]
    fn series_is_chronological_with_changes() {
        let rows = vec![row(2024, 3, 1100), row(2024, 1, 1000), row(2024, 3, 100), row(2023, 12, 0)];
        let series = monthly_series(&rows);
        let periods: Vec<_> = series.iter().map(|p| (p.year, p.month, p.amounts.gross_balance)).collect();
        assert_eq!(periods, vec![(2023, 12, 0), (2024, 1, 1000), (2024, 3, 1200)]);
        assert_eq!(series[0].change, None);
        assert_eq!(series[1].change, None);
        assert_eq!(series[2].change, Some(Decimal::new(2, 1)));
    }
}
