// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::reporting::CategoryTree;
use crate::utils::pretty_table;
use anyhow::Result;
use chrono::Datelike;
use rusqlite::Connection;

/// Consistency problems as `[issue, detail]` rows.
pub fn check(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Category parent chains that loop
    for id in CategoryTree::load(conn)?.cycles() {
        rows.push(vec!["category_cycle".into(), format!("category {}", id)]);
    }

    // 2) Stored year/month disagreeing with the record date
    let mut stmt = conn.prepare("SELECT id, date, year, month FROM investments ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let d: String = r.get(1)?;
        let year: i32 = r.get(2)?;
        let month: u32 = r.get(3)?;
        match chrono::NaiveDate::parse_from_str(&d, "%Y-%m-%d") {
            Ok(date) if date.year() == year && date.month() == month => {}
            Ok(_) => rows.push(vec![
                "period_mismatch".into(),
                format!("investment {}: {} vs {}-{:02}", id, d, year, month),
            ]),
            Err(_) => rows.push(vec![
                "bad_date".into(),
                format!("investment {}: '{}'", id, d),
            ]),
        }
    }

    // 3) Assets that diversification will report as uncategorized
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name FROM assets a
         WHERE NOT EXISTS (SELECT 1 FROM asset_categories ac WHERE ac.asset_id = a.id)
         ORDER BY a.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        rows.push(vec![
            "asset_without_category".into(),
            format!("asset {} '{}'", id, name),
        ]);
    }

    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = check(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        tracing::warn!(issues = rows.len(), "doctor found issues");
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
