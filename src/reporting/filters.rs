// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::category_tree::resolve_category_filter;
use crate::error::ActionError;
use crate::forms::{FormData, Validator};
use rusqlite::Connection;
use rusqlite::types::Value;
use serde::Serialize;

/// Form fields understood by [`InvestmentFilter::from_form`].
pub const FILTER_FIELDS: [&str; 7] = ["client", "year", "month", "bank", "asset", "type", "category"];

/// Optional filters over investment rows. `None` means "not filtered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvestmentFilter {
    pub client: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub bank: Option<String>,
    pub asset: Option<String>,
    pub asset_type: Option<String>,
    pub category: Option<i64>,
}

impl InvestmentFilter {
    pub fn from_form(form: &FormData) -> Result<Self, ActionError> {
        let mut v = Validator::new(form);
        let text = |field: &str| v.value(field).map(str::to_string);
        let client = text("client");
        let bank = text("bank");
        let asset = text("asset");
        let asset_type = text("type");

        let year = match v.value("year") {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(y) if (1900..=9999).contains(&y) => Some(y),
                _ => {
                    v.error("year", format!("Invalid year '{}'.", raw));
                    None
                }
            },
        };
        let month = match v.value("month") {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(m) if (1..=12).contains(&m) => Some(m),
                _ => {
                    v.error("month", format!("Invalid month '{}', expected 1-12.", raw));
                    None
                }
            },
        };
        let category = v.optional_id("category", "category");
        v.finish()?;

        Ok(InvestmentFilter {
            client,
            year,
            month,
            bank,
            asset,
            asset_type,
            category,
        })
    }

    /// Resolve the category subtree and compose the predicate.
    pub fn predicate(&self, conn: &Connection) -> Result<Predicate, ActionError> {
        let category_ids = resolve_category_filter(conn, self.category)?;
        Ok(Predicate::build(self, &category_ids))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Clause {
    ClientName(String),
    Year(i32),
    Month(u32),
    BankName(String),
    AssetName(String),
    TypeName(String),
    CategoryIn(Vec<i64>),
}

impl Clause {
    fn push_sql(&self, sql: &mut Vec<String>, params: &mut Vec<Value>) {
        match self {
            Clause::ClientName(s) => like("c.name", s, sql, params),
            Clause::BankName(s) => like("b.name", s, sql, params),
            Clause::AssetName(s) => like("a.name", s, sql, params),
            Clause::TypeName(s) => like("t.name", s, sql, params),
            Clause::Year(y) => {
                sql.push("i.year = ?".into());
                params.push(Value::Integer(i64::from(*y)));
            }
            Clause::Month(m) => {
                sql.push("i.month = ?".into());
                params.push(Value::Integer(i64::from(*m)));
            }
            Clause::CategoryIn(ids) => {
                let marks = vec!["?"; ids.len()].join(", ");
                sql.push(format!(
                    "EXISTS (SELECT 1 FROM asset_categories fc WHERE fc.asset_id = i.asset_id AND fc.category_id IN ({}))",
                    marks
                ));
                params.extend(ids.iter().map(|id| Value::Integer(*id)));
            }
        }
    }
}

fn like(column: &str, needle: &str, sql: &mut Vec<String>, params: &mut Vec<Value>) {
    sql.push(contains_sql(column));
    params.push(Value::Text(like_pattern(needle)));
}

/// Case-insensitive substring test of `column` against one
/// [`like_pattern`] parameter. Needs the `casefold` function from
/// `db::register_functions`.
pub fn contains_sql(column: &str) -> String {
    format!("casefold({}) LIKE casefold(?) ESCAPE '\\'", column)
}

/// `%needle%` with LIKE wildcards in the needle escaped.
pub fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

/// Conjunction of the filters that were actually supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn build(filter: &InvestmentFilter, category_ids: &[i64]) -> Self {
        let mut clauses = Vec::new();
        if let Some(s) = &filter.client {
            clauses.push(Clause::ClientName(s.clone()));
        }
        if let Some(y) = filter.year {
            clauses.push(Clause::Year(y));
        }
        if let Some(m) = filter.month {
            clauses.push(Clause::Month(m));
        }
        if let Some(s) = &filter.bank {
            clauses.push(Clause::BankName(s.clone()));
        }
        if let Some(s) = &filter.asset {
            clauses.push(Clause::AssetName(s.clone()));
        }
        if let Some(s) = &filter.asset_type {
            clauses.push(Clause::TypeName(s.clone()));
        }
        if !category_ids.is_empty() {
            clauses.push(Clause::CategoryIn(category_ids.to_vec()));
        }
        Predicate { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `WHERE` body over aliases `i` (investments), `c` (clients),
    /// `b` (banks), `a` (assets) and `t` (asset types).
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        if self.clauses.is_empty() {
            return ("1=1".to_string(), Vec::new());
        }
        let mut sql = Vec::with_capacity(self.clauses.len());
        let mut params = Vec::new();
        for clause in &self.clauses {
            clause.push_sql(&mut sql, &mut params);
        }
        (sql.join(" AND "), params)
    }
}
