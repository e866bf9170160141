// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::search_sql;
use crate::error::{ActionError, ConstraintExt};
use crate::forms::{FormData, Validator, form_from_matches, merge};
use crate::models::{Asset, Page, page_window};
use crate::utils::{
    id_arg, json_flags, maybe_print_json, page_arg, pretty_table, print_pager, query_arg,
    row_exists, submit,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;

pub const PAGE_SIZE: u32 = 15;
pub const FIELDS: [&str; 3] = ["name", "type_id", "categories"];

const NAME_TAKEN: &str = "An asset with this name already exists.";

#[derive(Debug, Clone, Serialize)]
pub struct AssetRow {
    pub id: i64,
    pub name: String,
    pub asset_type: Option<String>,
    /// Category names in association order.
    pub categories: Vec<String>,
}

struct AssetInput {
    name: String,
    type_id: Option<i64>,
    category_ids: Vec<i64>,
}

fn validate(conn: &Connection, form: &FormData) -> Result<AssetInput, ActionError> {
    let mut v = Validator::new(form);
    let name = v.required_text("name", "a name", 100);
    let type_id = v.optional_id("type_id", "asset type");
    if let Some(t) = type_id {
        if !row_exists(conn, "asset_types", t)? {
            v.error("type_id", format!("Asset type {} does not exist.", t));
        }
    }
    let category_ids = v.id_list("categories", "category");
    for &c in &category_ids {
        if !row_exists(conn, "categories", c)? {
            v.error("categories", format!("Category {} does not exist.", c));
        }
    }
    v.finish()?;
    Ok(AssetInput {
        name,
        type_id,
        category_ids,
    })
}

fn replace_categories(
    tx: &rusqlite::Transaction<'_>,
    asset_id: i64,
    category_ids: &[i64],
) -> rusqlite::Result<()> {
    tx.execute(
        "DELETE FROM asset_categories WHERE asset_id=?1",
        params![asset_id],
    )?;
    let mut stmt =
        tx.prepare("INSERT INTO asset_categories(asset_id, category_id) VALUES (?1, ?2)")?;
    for c in category_ids {
        stmt.execute(params![asset_id, c])?;
    }
    Ok(())
}

pub fn create(conn: &mut Connection, form: &FormData) -> Result<Asset, ActionError> {
    let input = validate(conn, form)?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO assets(name, type_id) VALUES (?1, ?2)",
        params![input.name, input.type_id],
    )
    .or_conflict("name", NAME_TAKEN)?;
    let id = tx.last_insert_rowid();
    replace_categories(&tx, id, &input.category_ids)?;
    tx.commit()?;
    tracing::info!(id, categories = input.category_ids.len(), "asset created");
    Ok(Asset {
        id,
        name: input.name,
        type_id: input.type_id,
        category_ids: input.category_ids,
    })
}

pub fn get(conn: &Connection, id: i64) -> Result<Asset, ActionError> {
    let found = conn
        .query_row(
            "SELECT name, type_id FROM assets WHERE id=?1",
            params![id],
            |r| Ok((r.get::<_, String>(0)?, r.get::<_, Option<i64>>(1)?)),
        )
        .optional()?;
    let Some((name, type_id)) = found else {
        return Err(ActionError::not_found("Asset", id));
    };
    let mut stmt = conn.prepare(
        "SELECT category_id FROM asset_categories WHERE asset_id=?1 ORDER BY rowid",
    )?;
    let category_ids = stmt
        .query_map(params![id], |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(Asset {
        id,
        name,
        type_id,
        category_ids,
    })
}

pub fn current_form(asset: &Asset) -> FormData {
    FormData::from([
        ("name".to_string(), asset.name.clone()),
        (
            "type_id".to_string(),
            asset.type_id.map(|t| t.to_string()).unwrap_or_default(),
        ),
        (
            "categories".to_string(),
            asset
                .category_ids
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
    ])
}

/// Update an asset; its category associations are replaced as a whole.
pub fn update(conn: &mut Connection, id: i64, changes: &FormData) -> Result<Asset, ActionError> {
    let current = get(conn, id)?;
    let form = merge(current_form(&current), changes);
    let input = validate(conn, &form)?;
    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE assets SET name=?1, type_id=?2 WHERE id=?3",
        params![input.name, input.type_id, id],
    )
    .or_conflict("name", NAME_TAKEN)?;
    replace_categories(&tx, id, &input.category_ids)?;
    tx.commit()?;
    tracing::info!(id, categories = input.category_ids.len(), "asset updated");
    Ok(Asset {
        id,
        name: input.name,
        type_id: input.type_id,
        category_ids: input.category_ids,
    })
}

/// Assets still used by investments are refused.
pub fn delete(conn: &Connection, id: i64) -> Result<(), ActionError> {
    let removed = conn
        .execute("DELETE FROM assets WHERE id=?1", params![id])
        .or_conflict("id", "Asset is still referenced by investments.")?;
    if removed == 0 {
        return Err(ActionError::not_found("Asset", id));
    }
    tracing::info!(id, "asset deleted");
    Ok(())
}

/// Assets matching `query` on asset or type name, by name.
pub fn list(conn: &Connection, query: Option<&str>, page: u32) -> Result<Page<AssetRow>, ActionError> {
    let (where_sql, mut params) = search_sql(&["a.name", "t.name"], query);
    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM assets a LEFT JOIN asset_types t ON t.id = a.type_id
             WHERE {where_sql}"
        ),
        params_from_iter(params.iter()),
        |r| r.get(0),
    )?;
    let (limit, offset) = page_window(page, PAGE_SIZE);
    params.push(limit.into());
    params.push(offset.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT a.id, a.name, t.name FROM assets a
         LEFT JOIN asset_types t ON t.id = a.type_id
         WHERE {where_sql}
         ORDER BY a.name, a.id LIMIT ? OFFSET ?"
    ))?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut cats = conn.prepare(
        "SELECT c.name FROM asset_categories ac JOIN categories c ON c.id = ac.category_id
         WHERE ac.asset_id=?1 ORDER BY ac.rowid",
    )?;
    let mut items = Vec::with_capacity(rows.len());
    for (id, name, asset_type) in rows {
        let categories = cats
            .query_map(params![id], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        items.push(AssetRow {
            id,
            name,
            asset_type,
            categories,
        });
    }
    Ok(Page::new(items, page.max(1), total, PAGE_SIZE))
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let form = form_from_matches(sub, &FIELDS);
            let asset = submit(create(conn, &form), &form)?;
            println!("Added asset '{}' (id {})", asset.name, asset.id);
        }
        Some(("edit", sub)) => {
            let id = id_arg(sub)?;
            let form = form_from_matches(sub, &FIELDS);
            let asset = submit(update(conn, id, &form), &form)?;
            println!("Updated asset {} '{}'", asset.id, asset.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            submit(delete(conn, id), &FormData::new())?;
            println!("Removed asset {}", id);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let query = query_arg(sub);
            let page = submit(
                list(conn, query.as_deref(), page_arg(sub)),
                &FormData::new(),
            )?;
            if !maybe_print_json(json_flag, jsonl_flag, &page.items)? {
                let data = page
                    .items
                    .iter()
                    .map(|a| {
                        vec![
                            a.id.to_string(),
                            a.name.clone(),
                            a.asset_type.clone().unwrap_or_default(),
                            a.categories.join(", "),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Asset", "Type", "Categories"], data)
                );
                print_pager(&page);
            }
        }
        _ => {}
    }
    Ok(())
}
