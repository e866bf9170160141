// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Name-only reference tables: banks and asset types.

use super::search_sql;
use crate::error::{ActionError, ConstraintExt};
use crate::forms::{FormData, Validator, form_from_matches};
use crate::models::{Page, page_window};
use crate::utils::{
    id_arg, json_flags, maybe_print_json, page_arg, pretty_table, print_pager, query_arg, submit,
};
use anyhow::Result;
use rusqlite::{Connection, params, params_from_iter};
use serde::Serialize;

pub const PAGE_SIZE: u32 = 15;

/// A reference table holding unique names.
#[derive(Debug)]
pub struct Lookup {
    pub table: &'static str,
    pub entity: &'static str,
    pub duplicate: &'static str,
    /// Message when the row is still used by investments or assets.
    pub in_use: &'static str,
}

pub const BANKS: Lookup = Lookup {
    table: "banks",
    entity: "Bank",
    duplicate: "A bank with this name already exists.",
    in_use: "Bank is still referenced by investments.",
};

pub const ASSET_TYPES: Lookup = Lookup {
    table: "asset_types",
    entity: "Asset type",
    duplicate: "An asset type with this name already exists.",
    in_use: "Asset type is still in use.",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRow {
    pub id: i64,
    pub name: String,
}

fn validate(form: &FormData) -> Result<String, ActionError> {
    let mut v = Validator::new(form);
    let name = v.required_text("name", "a name", 100);
    v.finish()?;
    Ok(name)
}

pub fn create(conn: &Connection, lookup: &Lookup, form: &FormData) -> Result<NamedRow, ActionError> {
    let name = validate(form)?;
    conn.execute(
        &format!("INSERT INTO {}(name) VALUES (?1)", lookup.table),
        params![name],
    )
    .or_conflict("name", lookup.duplicate)?;
    let id = conn.last_insert_rowid();
    tracing::info!(table = lookup.table, id, "row created");
    Ok(NamedRow { id, name })
}

pub fn update(
    conn: &Connection,
    lookup: &Lookup,
    id: i64,
    form: &FormData,
) -> Result<NamedRow, ActionError> {
    let name = validate(form)?;
    let changed = conn
        .execute(
            &format!("UPDATE {} SET name=?1 WHERE id=?2", lookup.table),
            params![name, id],
        )
        .or_conflict("name", lookup.duplicate)?;
    if changed == 0 {
        return Err(ActionError::not_found(lookup.entity, id));
    }
    tracing::info!(table = lookup.table, id, "row updated");
    Ok(NamedRow { id, name })
}

/// Banks still referenced by investments are refused; asset types are
/// detached from their assets.
pub fn delete(conn: &Connection, lookup: &Lookup, id: i64) -> Result<(), ActionError> {
    let removed = conn
        .execute(
            &format!("DELETE FROM {} WHERE id=?1", lookup.table),
            params![id],
        )
        .or_conflict("id", lookup.in_use)?;
    if removed == 0 {
        return Err(ActionError::not_found(lookup.entity, id));
    }
    tracing::info!(table = lookup.table, id, "row deleted");
    Ok(())
}

pub fn list(
    conn: &Connection,
    lookup: &Lookup,
    query: Option<&str>,
    page: u32,
) -> Result<Page<NamedRow>, ActionError> {
    let (where_sql, mut params) = search_sql(&["name"], query);
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE {}", lookup.table, where_sql),
        params_from_iter(params.iter()),
        |r| r.get(0),
    )?;
    let (limit, offset) = page_window(page, PAGE_SIZE);
    params.push(limit.into());
    params.push(offset.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name FROM {} WHERE {} ORDER BY name, id LIMIT ? OFFSET ?",
        lookup.table, where_sql
    ))?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |r| {
        Ok(NamedRow {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Page::new(items, page.max(1), total, PAGE_SIZE))
}

pub fn handle(conn: &Connection, lookup: &Lookup, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let form = form_from_matches(sub, &["name"]);
            let row = submit(create(conn, lookup, &form), &form)?;
            println!("Added {} '{}' (id {})", lookup.entity.to_lowercase(), row.name, row.id);
        }
        Some(("edit", sub)) => {
            let id = id_arg(sub)?;
            let form = form_from_matches(sub, &["name"]);
            let row = submit(update(conn, lookup, id, &form), &form)?;
            println!("Renamed {} {} to '{}'", lookup.entity.to_lowercase(), id, row.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            submit(delete(conn, lookup, id), &FormData::new())?;
            println!("Removed {} {}", lookup.entity.to_lowercase(), id);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let query = query_arg(sub);
            let page = submit(
                list(conn, lookup, query.as_deref(), page_arg(sub)),
                &FormData::new(),
            )?;
            if !maybe_print_json(json_flag, jsonl_flag, &page.items)? {
                let data = page
                    .items
                    .iter()
                    .map(|r| vec![r.id.to_string(), r.name.clone()])
                    .collect();
                println!("{}", pretty_table(&["ID", lookup.entity], data));
                print_pager(&page);
            }
        }
        _ => {}
    }
    Ok(())
}
