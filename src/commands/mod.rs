// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod assets;
pub mod categories;
pub mod clients;
pub mod doctor;
pub mod exporter;
pub mod investments;
pub mod invoices;
pub mod lookups;
pub mod reports;
pub mod settings;

use crate::reporting::filters::{contains_sql, like_pattern};
use rusqlite::types::Value;

/// Case-insensitive `(col LIKE ? OR ...)` over `columns` for an optional search box value.
/// A missing query matches everything.
pub(crate) fn search_sql(columns: &[&str], query: Option<&str>) -> (String, Vec<Value>) {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        None => ("1=1".to_string(), Vec::new()),
        Some(q) => {
            let sql = columns
                .iter()
                .map(|c| contains_sql(c))
                .collect::<Vec<_>>()
                .join(" OR ");
            let pattern = like_pattern(q);
            (
                format!("({})", sql),
                columns.iter().map(|_| Value::Text(pattern.clone())).collect(),
            )
        }
    }
}
