// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::filters::InvestmentFilter;
use super::rows::InvestmentRow;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const UNCATEGORIZED: &str = "(uncategorized)";

/// Which periods of the filtered set feed a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotPolicy {
    /// Only the most recent (year, month) present.
    Latest,
    /// Every row in scope.
    All,
}

impl SnapshotPolicy {
    /// Latest snapshot unless the filter already pins a month.
    pub fn default_for(filter: &InvestmentFilter) -> Self {
        if filter.month.is_some() {
            SnapshotPolicy::All
        } else {
            SnapshotPolicy::Latest
        }
    }
}

impl fmt::Display for SnapshotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnapshotPolicy::Latest => "latest",
            SnapshotPolicy::All => "all",
        })
    }
}

impl FromStr for SnapshotPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(SnapshotPolicy::Latest),
            "all" => Ok(SnapshotPolicy::All),
            other => Err(format!("Unknown snapshot policy '{}'", other)),
        }
    }
}

/// One pie-chart slice: summed gross balance in cents and its share of the
/// retained total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: i64,
    pub share: Decimal,
}

pub fn latest_period(rows: &[InvestmentRow]) -> Option<(i32, u32)> {
    rows.iter().map(|r| (r.year, r.month)).max()
}

fn in_scope(rows: &[InvestmentRow], policy: SnapshotPolicy) -> impl Iterator<Item = &InvestmentRow> {
    let latest = match policy {
        SnapshotPolicy::Latest => latest_period(rows),
        SnapshotPolicy::All => None,
    };
    rows.iter()
        .filter(move |r| latest.is_none_or(|period| (r.year, r.month) == period))
}

pub fn by_category(rows: &[InvestmentRow], policy: SnapshotPolicy) -> Vec<Slice> {
    distribute(in_scope(rows, policy), |r| {
        r.category.as_deref().unwrap_or(UNCATEGORIZED)
    })
}

pub fn by_bank(rows: &[InvestmentRow], policy: SnapshotPolicy) -> Vec<Slice> {
    distribute(in_scope(rows, policy), |r| r.bank.as_str())
}

fn distribute<'a>(
    rows: impl Iterator<Item = &'a InvestmentRow>,
    label: impl Fn(&'a InvestmentRow) -> &'a str,
) -> Vec<Slice> {
    let mut sums: HashMap<&str, i64> = HashMap::new();
    for row in rows {
        *sums.entry(label(row)).or_insert(0) += row.amounts.gross_balance;
    }
    let mut kept: Vec<(&str, i64)> = sums.into_iter().filter(|(_, v)| *v > 0).collect();
    let total: i64 = kept.iter().map(|(_, v)| v).sum();
    kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    kept.into_iter()
        .map(|(label, value)| Slice {
            label: label.to_string(),
            value,
            share: Decimal::from(value)
                .checked_div(Decimal::from(total))
                .unwrap_or(Decimal::ZERO),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::Amounts;
    use chrono::NaiveDate;

    fn row(year: i32, month: u32, bank: &str, category: Option<&str>, gross: i64) -> InvestmentRow {
        InvestmentRow {
            id: 0,
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            year,
            month,
            client: "Robson".into(),
            bank: bank.into(),
            asset: "Fundo".into(),
            asset_type: None,
            category: category.map(str::to_string),
            amounts: Amounts {
                gross_balance: gross,
                ..Amounts::default()
            },
        }
    }

    #[test]
    fn latest_policy_keeps_most_recent_period() {
        let rows = vec![
            row(2024, 2, "Itau", Some("CDB"), 1000),
            row(2024, 3, "Itau", Some("CDB"), 1200),
            row(2024, 3, "XP", Some("Acoes"), 300),
            row(2023, 12, "XP", Some("Acoes"), 9999),
        ];
        assert_eq!(latest_period(&rows), Some((2024, 3)));
        let slices = by_bank(&rows, SnapshotPolicy::Latest);
        assert_eq!(
            slices.iter().map(|s| (s.label.as_str(), s.value)).collect::<Vec<_>>(),
            vec![("Itau", 1200), ("XP", 300)]
        );
        assert_eq!(slices[0].share, Decimal::new(8, 1));
    }

    #[test]
    fn all_policy_sums_every_period() {
        let rows = vec![
            row(2024, 2, "Itau", Some("CDB"), 1000),
            row(2024, 3, "Itau", Some("CDB"), 1200),
        ];
        let slices = by_category(&rows, SnapshotPolicy::All);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].value, 2200);
        assert_eq!(slices[0].share, Decimal::ONE);
    }

    #[test]
    fn non_positive_sums_are_dropped() {
        let rows = vec![
            row(2024, 3, "Itau", Some("CDB"), 500),
            row(2024, 3, "Itau", Some("Cripto"), 200),
            row(2024, 3, "XP", Some("Cripto"), -200),
            row(2024, 3, "XP", Some("Opcoes"), -10),
            row(2024, 3, "XP", None, 40),
        ];
        let labels: Vec<_> = by_category(&rows, SnapshotPolicy::Latest)
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["CDB".to_string(), UNCATEGORIZED.to_string()]);
    }

    #[test]
    fn ties_sort_by_label() {
        let rows = vec![row(2024, 3, "B", None, 10), row(2024, 3, "A", None, 10)];
        let labels: Vec<_> = by_bank(&rows, SnapshotPolicy::All).into_iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[test]
    fn month_filter_switches_default_policy() {
        let mut filter = InvestmentFilter::default();
        assert_eq!(SnapshotPolicy::default_for(&filter), SnapshotPolicy::Latest);
        filter.month = Some(3);
        assert_eq!(SnapshotPolicy::default_for(&filter), SnapshotPolicy::All);
    }
}
