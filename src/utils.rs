// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ActionError;
use crate::format::render_pager;
use crate::forms::FormData;
use crate::models::Page;
use anyhow::{Context, Result, anyhow};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn json_flags(sub: &clap::ArgMatches) -> (bool, bool) {
    (sub.get_flag("json"), sub.get_flag("jsonl"))
}

/// `--id` argument, trimmed.
pub fn id_arg(sub: &clap::ArgMatches) -> Result<i64> {
    let raw = sub
        .get_one::<String>("id")
        .context("Missing --id")?
        .trim()
        .to_string();
    raw.parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", raw))
}

pub fn page_arg(sub: &clap::ArgMatches) -> u32 {
    sub.try_get_one::<u32>("page")
        .ok()
        .flatten()
        .copied()
        .unwrap_or(1)
        .max(1)
}

pub fn query_arg(sub: &clap::ArgMatches) -> Option<String> {
    sub.try_get_one::<String>("query")
        .ok()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn print_pager<T>(page: &Page<T>) {
    if page.total_pages > 1 {
        println!(
            "Page {} of {}: {}",
            page.page,
            page.total_pages,
            render_pager(page.page, page.total_pages)
        );
    }
}

/// Report a failed form submission the way a re-rendered form would:
/// field errors on stderr, the summary message as the returned error.
pub fn submit<T>(result: Result<T, ActionError>, values: &FormData) -> Result<T> {
    result.map_err(|err| {
        let state = err.into_state(values.clone());
        if !state.errors.is_empty() {
            let rows = state
                .errors
                .iter()
                .flat_map(|(field, messages)| {
                    messages
                        .iter()
                        .map(move |m| vec![field.to_string(), m.clone()])
                })
                .collect();
            eprintln!("{}", pretty_table(&["Field", "Error"], rows));
        }
        anyhow!(state.message.unwrap_or_else(|| "Operation failed.".into()))
    })
}

/// Whether `table` has a row with this id. `table` must be a trusted name.
pub fn row_exists(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id=?1", table),
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
