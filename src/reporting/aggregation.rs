// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::rows::InvestmentRow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// The nine monetary fields of an investment snapshot, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amounts {
    pub previous_balance: i64,
    pub monthly_yield: i64,
    pub dividends: i64,
    pub applied: i64,
    pub redeemed: i64,
    pub incurred_tax: i64,
    pub projected_tax: i64,
    pub gross_balance: i64,
    pub net_balance: i64,
}

impl Amounts {
    /// Column / form field names, in `values()` order.
    pub const FIELDS: [&'static str; 9] = [
        "previous_balance",
        "monthly_yield",
        "dividends",
        "applied",
        "redeemed",
        "incurred_tax",
        "projected_tax",
        "gross_balance",
        "net_balance",
    ];

    pub const LABELS: [&'static str; 9] = [
        "Previous",
        "Yield",
        "Dividends",
        "Applied",
        "Redeemed",
        "Tax Incurred",
        "Tax Projected",
        "Gross",
        "Net",
    ];

    pub fn values(&self) -> [i64; 9] {
        [
            self.previous_balance,
            self.monthly_yield,
            self.dividends,
            self.applied,
            self.redeemed,
            self.incurred_tax,
            self.projected_tax,
            self.gross_balance,
            self.net_balance,
        ]
    }

    pub fn from_values(v: [i64; 9]) -> Self {
        Amounts {
            previous_balance: v[0],
            monthly_yield: v[1],
            dividends: v[2],
            applied: v[3],
            redeemed: v[4],
            incurred_tax: v[5],
            projected_tax: v[6],
            gross_balance: v[7],
            net_balance: v[8],
        }
    }

    /// Denominator for the percentage metrics: the previous balance, or the
    /// amount applied when there was no previous balance.
    pub fn base(&self) -> Option<i64> {
        if self.previous_balance != 0 {
            Some(self.previous_balance)
        } else if self.applied != 0 {
            Some(self.applied)
        } else {
            None
        }
    }

    pub fn metrics(&self) -> Metrics {
        let Some(base) = self.base() else {
            return Metrics::default();
        };
        Metrics {
            growth: ratio(self.gross_balance - self.previous_balance, base),
            yield_rate: ratio(self.monthly_yield, base),
            dividend_rate: ratio(self.dividends, base),
        }
    }
}

impl Add for Amounts {
    type Output = Amounts;

    /// Saturates at the `i64` cents range instead of overflowing.
    fn add(self, rhs: Amounts) -> Amounts {
        let (a, b) = (self.values(), rhs.values());
        Amounts::from_values(std::array::from_fn(|i| a[i].saturating_add(b[i])))
    }
}

impl AddAssign for Amounts {
    fn add_assign(&mut self, rhs: Amounts) {
        *self = *self + rhs;
    }
}

impl Sum for Amounts {
    fn sum<I: Iterator<Item = Amounts>>(iter: I) -> Amounts {
        iter.fold(Amounts::default(), Add::add)
    }
}

impl<'a> Sum<&'a Amounts> for Amounts {
    fn sum<I: Iterator<Item = &'a Amounts>>(iter: I) -> Amounts {
        iter.copied().sum()
    }
}

fn ratio(numerator: i64, denominator: i64) -> Option<Decimal> {
    Decimal::from(numerator).checked_div(Decimal::from(denominator))
}

/// Growth, yield and dividend rates as fractions of the base.
/// `None` when there is no base to divide by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub growth: Option<Decimal>,
    pub yield_rate: Option<Decimal>,
    pub dividend_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    pub client: String,
    pub year: i32,
    pub month: u32,
}

impl GroupKey {
    fn of(row: &InvestmentRow) -> Self {
        GroupKey {
            client: row.client.clone(),
            year: row.year,
            month: row.month,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupTotals {
    pub key: GroupKey,
    pub records: usize,
    pub amounts: Amounts,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvestmentReport {
    pub groups: Vec<GroupTotals>,
    pub total: Amounts,
    pub total_metrics: Metrics,
}

/// Bucket rows by (client, year, month) in first-seen order and sum each
/// bucket, plus a grand total over all rows.
pub fn aggregate(rows: &[InvestmentRow]) -> InvestmentReport {
    let mut groups: Vec<GroupTotals> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for row in rows {
        let key = GroupKey::of(row);
        let idx = match index.get(&key) {
            Some(&idx) => idx,
            None => {
                groups.push(GroupTotals {
                    key: key.clone(),
                    records: 0,
                    amounts: Amounts::default(),
                    metrics: Metrics::default(),
                });
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.records += 1;
        group.amounts += row.amounts;
    }

    for group in &mut groups {
        group.metrics = group.amounts.metrics();
    }

    let total: Amounts = rows.iter().map(|r| &r.amounts).sum();
    InvestmentReport {
        groups,
        total,
        total_metrics: total.metrics(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    #[test]
    fn addition_saturates_instead_of_overflowing() {
        let big = Amounts {
            gross_balance: i64::MAX - 1,
            monthly_yield: i64::MIN + 1,
            ..Amounts::default()
        };
        let sum = big + big;
        assert_eq!(sum.gross_balance, i64::MAX);
        assert_eq!(sum.monthly_yield, i64::MIN);
        assert_eq!(sum.applied, 0);
    }

    fn row(client: &str, year: i32, month: u32, previous: i64, applied: i64, gross: i64) -> InvestmentRow {
        InvestmentRow {
            id: 0,
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            year,
            month,
            client: client.into(),
            bank: "Banco".into(),
            asset: "CDB".into(),
            asset_type: None,
            category: None,
            amounts: Amounts {
                previous_balance: previous,
                applied,
                gross_balance: gross,
                net_balance: gross - 10,
                monthly_yield: gross - previous - applied,
                dividends: 5,
                ..Amounts::default()
            },
        }
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let rows = vec![
            row("Robson", 2024, 3, 1000, 0, 1100),
            row("Ana", 2024, 3, 500, 0, 510),
            row("Robson", 2024, 3, 2000, 0, 2020),
            row("Robson", 2024, 2, 900, 100, 1000),
        ];
        let report = aggregate(&rows);
        let keys: Vec<_> = report
            .groups
            .iter()
            .map(|g| (g.key.client.as_str(), g.key.month, g.records))
            .collect();
        assert_eq!(keys, vec![("Robson", 3, 2), ("Ana", 3, 1), ("Robson", 2, 1)]);
        assert_eq!(report.groups[0].amounts.gross_balance, 3120);
    }

    #[test]
    fn group_totals_sum_to_grand_total() {
        let rows = vec![
            row("Robson", 2024, 3, 1000, 0, 1100),
            row("Ana", 2024, 3, 500, 50, 560),
            row("Robson", 2024, 2, 0, 800, 805),
            row("Ana", 2023, 12, -40, 0, 0),
        ];
        let report = aggregate(&rows);
        let summed: Amounts = report.groups.iter().map(|g| g.amounts).sum();
        assert_eq!(summed, report.total);
        assert_eq!(report.total.values().iter().sum::<i64>(), rows.iter().map(|r| r.amounts.values().iter().sum::<i64>()).sum::<i64>());
    }

    #[test]
    fn metrics_use_previous_balance_as_base() {
        let a = row("X", 2024, 1, 1000, 200, 1300).amounts;
        let m = a.metrics();
        assert_eq!(m.growth, Some(Decimal::from_str("0.3").unwrap()));
        assert_eq!(m.yield_rate, Some(Decimal::from_str("0.1").unwrap()));
        assert_eq!(m.dividend_rate, Some(Decimal::from_str("0.005").unwrap()));
    }

    #[test]
    fn metrics_fall_back_to_applied() {
        let a = row("X", 2024, 1, 0, 1000, 1050).amounts;
        assert_eq!(a.base(), Some(1000));
        assert_eq!(a.metrics().growth, Some(Decimal::from_str("1.05").unwrap()));
    }

    #[test]
    fn zero_base_yields_no_metrics() {
        let a = row("X", 2024, 1, 0, 0, 50).amounts;
        assert_eq!(a.base(), None);
        assert_eq!(a.metrics(), Metrics::default());
    }

    #[test]
    fn empty_input_gives_zero_totals() {
        let report = aggregate(&[]);
        assert!(report.groups.is_empty());
        assert_eq!(report.total, Amounts::default());
        assert_eq!(report.total_metrics.growth, None);
    }
}
