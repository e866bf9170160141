// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::aggregation::{Amounts, Metrics};
use super::filters::Predicate;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use serde::Serialize;

/// An investment snapshot joined with the names it references.
#[derive(Debug, Clone, Serialize)]
pub struct InvestmentRow {
    pub id: i64,
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub client: String,
    pub bank: String,
    pub asset: String,
    pub asset_type: Option<String>,
    /// First category associated with the asset.
    pub category: Option<String>,
    pub amounts: Amounts,
}

impl InvestmentRow {
    pub fn metrics(&self) -> Metrics {
        self.amounts.metrics()
    }
}

const JOINS: &str = "FROM investments i
     JOIN clients c ON c.id = i.client_id
     JOIN banks b ON b.id = i.bank_id
     JOIN assets a ON a.id = i.asset_id
     LEFT JOIN asset_types t ON t.id = a.type_id";

/// Matching rows ordered by client, newest period first, then bank and asset.
/// `window` is an optional `(limit, offset)` pair.
pub fn fetch_rows(
    conn: &Connection,
    predicate: &Predicate,
    window: Option<(i64, i64)>,
) -> rusqlite::Result<Vec<InvestmentRow>> {
    let (where_sql, mut params) = predicate.to_sql();
    let mut sql = format!(
        "SELECT i.id, i.date, i.year, i.month, c.name, b.name, a.name, t.name,
                (SELECT cat.name FROM asset_categories ac
                   JOIN categories cat ON cat.id = ac.category_id
                  WHERE ac.asset_id = a.id ORDER BY ac.rowid LIMIT 1),
                i.previous_balance, i.monthly_yield, i.dividends, i.applied, i.redeemed,
                i.incurred_tax, i.projected_tax, i.gross_balance, i.net_balance
         {JOINS}
         WHERE {where_sql}
         ORDER BY c.name, i.year DESC, i.month DESC, b.name, a.name, i.id"
    );
    if let Some((limit, offset)) = window {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Value::Integer(limit));
        params.push(Value::Integer(offset));
    }
    tracing::debug!(%sql, params = params.len(), "fetching investment rows");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |r| {
        let mut money = [0i64; 9];
        for (i, slot) in money.iter_mut().enumerate() {
            *slot = r.get(9 + i)?;
        }
        Ok(InvestmentRow {
            id: r.get(0)?,
            date: r.get(1)?,
            year: r.get(2)?,
            month: r.get(3)?,
            client: r.get(4)?,
            bank: r.get(5)?,
            asset: r.get(6)?,
            asset_type: r.get(7)?,
            category: r.get(8)?,
            amounts: Amounts::from_values(money),
        })
    })?;
    rows.collect()
}

pub fn count_rows(conn: &Connection, predicate: &Predicate) -> rusqlite::Result<i64> {
    let (where_sql, params) = predicate.to_sql();
    let sql = format!("SELECT COUNT(*) {JOINS} WHERE {where_sql}");
    conn.query_row(&sql, params_from_iter(params.iter()), |r| r.get(0))
}
