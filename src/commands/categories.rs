// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::search_sql;
use crate::error::ActionError;
use crate::forms::{FormData, Validator, form_from_matches, merge};
use crate::models::{Category, Page, page_window};
use crate::reporting::CategoryTree;
use crate::utils::{
    id_arg, json_flags, maybe_print_json, page_arg, pretty_table, print_pager, query_arg, submit,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use std::collections::HashMap;

pub const PAGE_SIZE: u32 = 15;
pub const FIELDS: [&str; 2] = ["name", "parent_id"];

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    /// `Parent / Child` from the root down.
    pub path: String,
}

/// Validate a category form. `id` is the category being edited.
fn validate(
    conn: &Connection,
    id: Option<i64>,
    form: &FormData,
) -> Result<(String, Option<i64>), ActionError> {
    let mut v = Validator::new(form);
    let name = v.required_text("name", "a name", 100);
    let parent_id = v.optional_id("parent_id", "parent category");
    if let Some(parent) = parent_id {
        let tree = CategoryTree::load(conn)?;
        if !tree.contains(parent) {
            v.error("parent_id", format!("Parent category {} does not exist.", parent));
        } else if let Some(id) = id {
            if tree.would_cycle(id, parent) {
                v.error(
                    "parent_id",
                    "A category cannot be nested under itself or one of its sub-categories.",
                );
            }
        }
    }
    v.finish()?;
    Ok((name, parent_id))
}

pub fn create(conn: &Connection, form: &FormData) -> Result<Category, ActionError> {
    let (name, parent_id) = validate(conn, None, form)?;
    conn.execute(
        "INSERT INTO categories(name, parent_id) VALUES (?1, ?2)",
        params![name, parent_id],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, ?parent_id, "category created");
    Ok(Category {
        id,
        name,
        parent_id,
    })
}

pub fn get(conn: &Connection, id: i64) -> Result<Category, ActionError> {
    conn.query_row(
        "SELECT id, name, parent_id FROM categories WHERE id=?1",
        params![id],
        |r| {
            Ok(Category {
                id: r.get(0)?,
                name: r.get(1)?,
                parent_id: r.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| ActionError::not_found("Category", id))
}

pub fn current_form(category: &Category) -> FormData {
    FormData::from([
        ("name".to_string(), category.name.clone()),
        (
            "parent_id".to_string(),
            category.parent_id.map(|p| p.to_string()).unwrap_or_default(),
        ),
    ])
}

pub fn update(conn: &Connection, id: i64, changes: &FormData) -> Result<Category, ActionError> {
    let current = get(conn, id)?;
    let form = merge(current_form(&current), changes);
    let (name, parent_id) = validate(conn, Some(id), &form)?;
    conn.execute(
        "UPDATE categories SET name=?1, parent_id=?2 WHERE id=?3",
        params![name, parent_id, id],
    )?;
    tracing::info!(id, ?parent_id, "category updated");
    Ok(Category {
        id,
        name,
        parent_id,
    })
}

/// Children are re-rooted and asset associations dropped by the schema.
pub fn delete(conn: &Connection, id: i64) -> Result<(), ActionError> {
    if conn.execute("DELETE FROM categories WHERE id=?1", params![id])? == 0 {
        return Err(ActionError::not_found("Category", id));
    }
    tracing::info!(id, "category deleted");
    Ok(())
}

/// Category names keyed by id.
fn names(conn: &Connection) -> rusqlite::Result<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories")?;
    let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
    rows.collect()
}

pub fn path(tree: &CategoryTree, names: &HashMap<i64, String>, id: i64) -> String {
    tree.lineage(id)
        .iter()
        .filter_map(|c| names.get(c).map(String::as_str))
        .collect::<Vec<_>>()
        .join(" / ")
}

pub fn list(
    conn: &Connection,
    query: Option<&str>,
    page: u32,
) -> Result<Page<CategoryRow>, ActionError> {
    let (where_sql, mut params) = search_sql(&["name"], query);
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM categories WHERE {where_sql}"),
        params_from_iter(params.iter()),
        |r| r.get(0),
    )?;
    let (limit, offset) = page_window(page, PAGE_SIZE);
    params.push(limit.into());
    params.push(offset.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, parent_id FROM categories WHERE {where_sql}
         ORDER BY name, id LIMIT ? OFFSET ?"
    ))?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<i64>>(2)?,
        ))
    })?;
    let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;

    let tree = CategoryTree::load(conn)?;
    let names = names(conn)?;
    let items = rows
        .into_iter()
        .map(|(id, name, parent_id)| CategoryRow {
            id,
            path: path(&tree, &names, id),
            name,
            parent_id,
        })
        .collect();
    Ok(Page::new(items, page.max(1), total, PAGE_SIZE))
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let form = form_from_matches(sub, &FIELDS);
            let category = submit(create(conn, &form), &form)?;
            println!("Added category '{}' (id {})", category.name, category.id);
        }
        Some(("edit", sub)) => {
            let id = id_arg(sub)?;
            let form = form_from_matches(sub, &FIELDS);
            let category = submit(update(conn, id, &form), &form)?;
            println!("Updated category {} '{}'", category.id, category.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            submit(delete(conn, id), &FormData::new())?;
            println!("Removed category {}", id);
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
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.parent_id.map(|p| p.to_string()).unwrap_or_default(),
                            c.path.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Category", "Parent", "Path"], data)
                );
                print_pager(&page);
            }
        }
        _ => {}
    }
    Ok(())
}
