// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::search_sql;
use crate::config::DisplayConfig;
use crate::error::ActionError;
use crate::format::{cents_to_decimal, format_cents, format_date, parse_money};
use crate::forms::{FormData, Validator, form_from_matches, merge};
use crate::models::{Invoice, InvoiceStatus, Page, page_window};
use crate::utils::{
    id_arg, json_flags, maybe_print_json, page_arg, pretty_table, print_pager, query_arg,
    row_exists, submit,
};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;

pub const PAGE_SIZE: u32 = 10;
pub const FIELDS: [&str; 4] = ["client_id", "amount", "status", "date"];

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRow {
    pub id: i64,
    pub client: String,
    pub email: String,
    pub amount: i64,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

fn validate(conn: &Connection, form: &FormData) -> Result<(i64, i64, InvoiceStatus, NaiveDate), ActionError> {
    let mut v = Validator::new(form);
    let client_id = v.required_id("client_id", "a client");
    if !v.has_error("client_id") && !row_exists(conn, "clients", client_id)? {
        v.error("client_id", format!("Client {} does not exist.", client_id));
    }
    let amount = v.positive_money("amount", "an amount");
    let status = v.choice::<InvoiceStatus>("status", "an invoice status", &InvoiceStatus::ALL);
    let date = v.date("date", "a date");
    v.finish()?;
    Ok((
        client_id,
        amount,
        status.unwrap_or(InvoiceStatus::Pending),
        date,
    ))
}

/// Create an invoice. A missing date means today.
pub fn create(conn: &Connection, form: &FormData) -> Result<Invoice, ActionError> {
    let mut form = form.clone();
    if form.get("date").is_none_or(|d| d.trim().is_empty()) {
        form.insert(
            "date".to_string(),
            Local::now().date_naive().format("%Y-%m-%d").to_string(),
        );
    }
    let (client_id, amount, status, date) = validate(conn, &form)?;
    conn.execute(
        "INSERT INTO invoices(client_id, amount, status, date) VALUES (?1, ?2, ?3, ?4)",
        params![client_id, amount, status.as_str(), date],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, client_id, %status, "invoice created");
    Ok(Invoice {
        id,
        client_id,
        amount,
        status,
        date,
    })
}

fn status_from_sql(idx: usize, raw: String) -> rusqlite::Result<InvoiceStatus> {
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })
}

pub fn get(conn: &Connection, id: i64) -> Result<Invoice, ActionError> {
    conn.query_row(
        "SELECT id, client_id, amount, status, date FROM invoices WHERE id=?1",
        params![id],
        |r| {
            Ok(Invoice {
                id: r.get(0)?,
                client_id: r.get(1)?,
                amount: r.get(2)?,
                status: status_from_sql(3, r.get(3)?)?,
                date: r.get(4)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| ActionError::not_found("Invoice", id))
}

pub fn current_form(invoice: &Invoice) -> FormData {
    FormData::from([
        ("client_id".to_string(), invoice.client_id.to_string()),
        (
            "amount".to_string(),
            cents_to_decimal(invoice.amount).to_string(),
        ),
        ("status".to_string(), invoice.status.to_string()),
        (
            "date".to_string(),
            invoice.date.format("%Y-%m-%d").to_string(),
        ),
    ])
}

pub fn update(conn: &Connection, id: i64, changes: &FormData) -> Result<Invoice, ActionError> {
    let current = get(conn, id)?;
    let form = merge(current_form(&current), changes);
    let (client_id, amount, status, date) = validate(conn, &form)?;
    conn.execute(
        "UPDATE invoices SET client_id=?1, amount=?2, status=?3, date=?4 WHERE id=?5",
        params![client_id, amount, status.as_str(), date, id],
    )?;
    tracing::info!(id, %status, "invoice updated");
    Ok(Invoice {
        id,
        client_id,
        amount,
        status,
        date,
    })
}

pub fn delete(conn: &Connection, id: i64) -> Result<(), ActionError> {
    if conn.execute("DELETE FROM invoices WHERE id=?1", params![id])? == 0 {
        return Err(ActionError::not_found("Invoice", id));
    }
    tracing::info!(id, "invoice deleted");
    Ok(())
}

/// Invoices matching `query` on client name, email, status or date, or
/// equal to it as an amount. Newest first.
pub fn list(conn: &Connection, query: Option<&str>, page: u32) -> Result<Page<InvoiceRow>, ActionError> {
    let (mut where_sql, mut params) =
        search_sql(&["c.name", "c.email", "v.status", "v.date"], query);
    if let Some(cents) = query.and_then(parse_money) {
        where_sql = format!("({} OR v.amount = ?)", where_sql);
        params.push(Value::Integer(cents));
    }
    let from = "FROM invoices v JOIN clients c ON c.id = v.client_id";
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) {from} WHERE {where_sql}"),
        params_from_iter(params.iter()),
        |r| r.get(0),
    )?;
    let (limit, offset) = page_window(page, PAGE_SIZE);
    params.push(limit.into());
    params.push(offset.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT v.id, c.name, c.email, v.amount, v.status, v.date {from}
         WHERE {where_sql}
         ORDER BY v.date DESC, v.id DESC LIMIT ? OFFSET ?"
    ))?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |r| {
        Ok(InvoiceRow {
            id: r.get(0)?,
            client: r.get(1)?,
            email: r.get(2)?,
            amount: r.get(3)?,
            status: status_from_sql(4, r.get(4)?)?,
            date: r.get(5)?,
        })
    })?;
    let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Page::new(items, page.max(1), total, PAGE_SIZE))
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let form = form_from_matches(sub, &FIELDS);
            let invoice = submit(create(conn, &form), &form)?;
            println!(
                "Added invoice {} ({}) for client {}",
                invoice.id, invoice.status, invoice.client_id
            );
        }
        Some(("edit", sub)) => {
            let id = id_arg(sub)?;
            let form = form_from_matches(sub, &FIELDS);
            let invoice = submit(update(conn, id, &form), &form)?;
            println!("Updated invoice {} ({})", invoice.id, invoice.status);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            submit(delete(conn, id), &FormData::new())?;
            println!("Removed invoice {}", id);
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
                    .map(|v| {
                        vec![
                            v.id.to_string(),
                            v.client.clone(),
                            v.email.clone(),
                            format_cents(v.amount, &cfg),
                            v.status.to_string(),
                            format_date(v.date, &cfg),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Client", "Email", "Amount", "Status", "Date"],
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
