// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::search_sql;
use crate::config::DisplayConfig;
use crate::error::{ActionError, ConstraintExt};
use crate::format::format_cents;
use crate::forms::{FormData, Validator, form_from_matches, merge};
use crate::models::{Client, Page, page_window};
use crate::utils::{
    id_arg, json_flags, maybe_print_json, page_arg, pretty_table, print_pager, query_arg, submit,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;

pub const PAGE_SIZE: u32 = 10;
pub const FIELDS: [&str; 2] = ["name", "email"];

const EMAIL_TAKEN: &str = "A client with this email already exists.";

/// Client with its invoice roll-up, as listed.
#[derive(Debug, Clone, Serialize)]
pub struct ClientRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub invoices: i64,
    pub pending: i64,
    pub paid: i64,
}

fn validate(form: &FormData) -> Result<(String, String), ActionError> {
    let mut v = Validator::new(form);
    let name = v.required_text("name", "a name", 100);
    let email = v.email("email");
    v.finish()?;
    Ok((name, email))
}

pub fn create(conn: &Connection, form: &FormData) -> Result<Client, ActionError> {
    let (name, email) = validate(form)?;
    conn.execute(
        "INSERT INTO clients(name, email) VALUES (?1, ?2)",
        params![name, email],
    )
    .or_conflict("email", EMAIL_TAKEN)?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, "client created");
    Ok(Client { id, name, email })
}

pub fn get(conn: &Connection, id: i64) -> Result<Client, ActionError> {
    conn.query_row(
        "SELECT id, name, email FROM clients WHERE id=?1",
        params![id],
        |r| {
            Ok(Client {
                id: r.get(0)?,
                name: r.get(1)?,
                email: r.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| ActionError::not_found("Client", id))
}

pub fn current_form(client: &Client) -> FormData {
    FormData::from([
        ("name".to_string(), client.name.clone()),
        ("email".to_string(), client.email.clone()),
    ])
}

pub fn update(conn: &Connection, id: i64, changes: &FormData) -> Result<Client, ActionError> {
    let current = get(conn, id)?;
    let form = merge(current_form(&current), changes);
    let (name, email) = validate(&form)?;
    conn.execute(
        "UPDATE clients SET name=?1, email=?2 WHERE id=?3",
        params![name, email, id],
    )
    .or_conflict("email", EMAIL_TAKEN)?;
    tracing::info!(id, "client updated");
    Ok(Client { id, name, email })
}

/// Remove a client with its investments and invoices in one transaction.
pub fn delete(conn: &mut Connection, id: i64) -> Result<(), ActionError> {
    let tx = conn.transaction()?;
    let investments = tx.execute("DELETE FROM investments WHERE client_id=?1", params![id])?;
    let invoices = tx.execute("DELETE FROM invoices WHERE client_id=?1", params![id])?;
    if tx.execute("DELETE FROM clients WHERE id=?1", params![id])? == 0 {
        return Err(ActionError::not_found("Client", id));
    }
    tx.commit()?;
    tracing::info!(id, investments, invoices, "client deleted");
    Ok(())
}

/// Clients matching `query` on name or email, by name.
pub fn list(conn: &Connection, query: Option<&str>, page: u32) -> Result<Page<ClientRow>, ActionError> {
    let (where_sql, mut params) = search_sql(&["c.name", "c.email"], query);
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM clients c WHERE {where_sql}"),
        params_from_iter(params.iter()),
        |r| r.get(0),
    )?;

    let (limit, offset) = page_window(page, PAGE_SIZE);
    params.push(limit.into());
    params.push(offset.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT c.id, c.name, c.email,
                COUNT(v.id),
                IFNULL(SUM(CASE WHEN v.status='pending' THEN v.amount END), 0),
                IFNULL(SUM(CASE WHEN v.status='paid' THEN v.amount END), 0)
         FROM clients c
         LEFT JOIN invoices v ON v.client_id = c.id
         WHERE {where_sql}
         GROUP BY c.id
         ORDER BY c.name, c.id
         LIMIT ? OFFSET ?"
    ))?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |r| {
        Ok(ClientRow {
            id: r.get(0)?,
            name: r.get(1)?,
            email: r.get(2)?,
            invoices: r.get(3)?,
            pending: r.get(4)?,
            paid: r.get(5)?,
        })
    })?;
    let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    tracing::debug!(page, total, "listed clients");
    Ok(Page::new(items, page.max(1), total, PAGE_SIZE))
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let form = form_from_matches(sub, &FIELDS);
            let client = submit(create(conn, &form), &form)?;
            println!("Added client '{}' (id {})", client.name, client.id);
        }
        Some(("edit", sub)) => {
            let id = id_arg(sub)?;
            let form = form_from_matches(sub, &FIELDS);
            let client = submit(update(conn, id, &form), &form)?;
            println!("Updated client {} '{}'", client.id, client.name);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            submit(delete(conn, id), &FormData::new())?;
            println!("Removed client {}", id);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let query = query_arg(sub);
            let page = submit(
                list(conn, query.as_deref(), page_arg(sub)),
                &FormData::new(),
            )?;
            if !maybe_print_json(json_flag, jsonl_flag, &page.items)? {
                let cfg = DisplayConfig::load(conn)?;
                let data = page
                    .items
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.email.clone(),
                            c.invoices.to_string(),
                            format_cents(c.pending, &cfg),
                            format_cents(c.paid, &cfg),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Name", "Email", "Invoices", "Pending", "Paid"],
                        data
                    )
                );
                print_pager(&page);
            }
        }
        _ => {}
    }
    Ok(())
}
