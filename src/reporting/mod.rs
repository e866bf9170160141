// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Investment reporting: category expansion, filtering, grouped totals,
//! diversification and performance series.

pub mod aggregation;
pub mod category_tree;
pub mod diversification;
pub mod filters;
pub mod performance;
pub mod rows;

pub use aggregation::{Amounts, GroupKey, GroupTotals, InvestmentReport, Metrics, aggregate};
pub use category_tree::{CategoryTree, resolve_category_filter};
pub use diversification::{SnapshotPolicy, Slice, by_bank, by_category, latest_period};
pub use filters::{Clause, InvestmentFilter, Predicate};
pub use performance::{PeriodPoint, monthly_series};
pub use rows::{InvestmentRow, count_rows, fetch_rows};
