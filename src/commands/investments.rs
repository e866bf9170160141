// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::DisplayConfig;
use crate::error::ActionError;
use crate::format::{cents_to_decimal, format_cents, format_date, format_rate, year_month};
use crate::forms::{FormData, Validator, form_from_matches, merge};
use crate::models::{Investment, Page, page_window};
use crate::reporting::filters::FILTER_FIELDS;
use crate::reporting::{
    Amounts, InvestmentFilter, InvestmentRow, Metrics, Predicate, count_rows, fetch_rows,
};
use crate::utils::{
    id_arg, json_flags, maybe_print_json, page_arg, pretty_table, print_pager, row_exists, submit,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub const PAGE_SIZE: u32 = 20;

/// Form fields of an investment record.
pub fn fields() -> Vec<&'static str> {
    let mut f = vec!["date", "client_id", "bank_id", "asset_id"];
    f.extend(Amounts::FIELDS);
    f
}

/// A listed row with its own rates.
#[derive(Debug, Clone, Serialize)]
pub struct ListedInvestment {
    #[serde(flatten)]
    pub row: InvestmentRow,
    pub metrics: Metrics,
}

struct InvestmentInput {
    date: NaiveDate,
    client_id: i64,
    bank_id: i64,
    asset_id: i64,
    amounts: Amounts,
}

/// Gross balance of the latest record before `date` for the same
/// client, bank and asset.
pub fn carried_balance(
    conn: &Connection,
    client_id: i64,
    bank_id: i64,
    asset_id: i64,
    date: NaiveDate,
    exclude: Option<i64>,
) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT gross_balance FROM investments
         WHERE client_id=?1 AND bank_id=?2 AND asset_id=?3 AND date < ?4 AND id != ?5
         ORDER BY date DESC, id DESC LIMIT 1",
        params![client_id, bank_id, asset_id, date, exclude.unwrap_or(0)],
        |r| r.get(0),
    )
    .optional()
}

fn validate(
    conn: &Connection,
    id: Option<i64>,
    form: &FormData,
) -> Result<InvestmentInput, ActionError> {
    let mut v = Validator::new(form);
    let date = v.date("date", "a date");
    let client_id = v.required_id("client_id", "a client");
    let bank_id = v.required_id("bank_id", "a bank");
    let asset_id = v.required_id("asset_id", "an asset");
    for (field, table, label) in [
        ("client_id", "clients", "Client"),
        ("bank_id", "banks", "Bank"),
        ("asset_id", "assets", "Asset"),
    ] {
        let ref_id = match field {
            "client_id" => client_id,
            "bank_id" => bank_id,
            _ => asset_id,
        };
        if !v.has_error(field) && !row_exists(conn, table, ref_id)? {
            v.error(field, format!("{} {} does not exist.", label, ref_id));
        }
    }

    let mut values = [0i64; 9];
    let mut previous_blank = false;
    for (slot, (field, label)) in values
        .iter_mut()
        .zip(Amounts::FIELDS.iter().zip(Amounts::LABELS))
    {
        if v.value(field).is_none() {
            previous_blank |= *field == "previous_balance";
            continue;
        }
        *slot = v.money(field, &label.to_lowercase()).unwrap_or(0);
    }
    v.finish()?;

    let mut amounts = Amounts::from_values(values);
    if previous_blank {
        if let Some(carried) = carried_balance(conn, client_id, bank_id, asset_id, date, id)? {
            tracing::debug!(client_id, bank_id, asset_id, carried, "previous balance carried forward");
            amounts.previous_balance = carried;
        }
    }
    Ok(InvestmentInput {
        date,
        client_id,
        bank_id,
        asset_id,
        amounts,
    })
}

fn into_investment(id: i64, input: InvestmentInput) -> Investment {
    let (year, month) = year_month(input.date);
    Investment {
        id,
        date: input.date,
        year,
        month,
        client_id: input.client_id,
        bank_id: input.bank_id,
        asset_id: input.asset_id,
        amounts: input.amounts,
    }
}

pub fn create(conn: &Connection, form: &FormData) -> Result<Investment, ActionError> {
    let input = validate(conn, None, form)?;
    let (year, month) = year_month(input.date);
    let a = input.amounts;
    conn.execute(
        "INSERT INTO investments(date, year, month, client_id, bank_id, asset_id,
            previous_balance, monthly_yield, dividends, applied, redeemed,
            incurred_tax, projected_tax, gross_balance, net_balance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            input.date,
            year,
            month,
            input.client_id,
            input.bank_id,
            input.asset_id,
            a.previous_balance,
            a.monthly_yield,
            a.dividends,
            a.applied,
            a.redeemed,
            a.incurred_tax,
            a.projected_tax,
            a.gross_balance,
            a.net_balance
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, client_id = input.client_id, year, month, "investment created");
    Ok(into_investment(id, input))
}

pub fn get(conn: &Connection, id: i64) -> Result<Investment, ActionError> {
    conn.query_row(
        "SELECT id, date, year, month, client_id, bank_id, asset_id,
                previous_balance, monthly_yield, dividends, applied, redeemed,
                incurred_tax, projected_tax, gross_balance, net_balance
         FROM investments WHERE id=?1",
        params![id],
        |r| {
            let mut money = [0i64; 9];
            for (i, slot) in money.iter_mut().enumerate() {
                *slot = r.get(7 + i)?;
            }
            Ok(Investment {
                id: r.get(0)?,
                date: r.get(1)?,
                year: r.get(2)?,
                month: r.get(3)?,
                client_id: r.get(4)?,
                bank_id: r.get(5)?,
                asset_id: r.get(6)?,
                amounts: Amounts::from_values(money),
            })
        },
    )
    .optional()?
    .ok_or_else(|| ActionError::not_found("Investment", id))
}

pub fn current_form(inv: &Investment) -> FormData {
    let mut form = FormData::from([
        ("date".to_string(), inv.date.format("%Y-%m-%d").to_string()),
        ("client_id".to_string(), inv.client_id.to_string()),
        ("bank_id".to_string(), inv.bank_id.to_string()),
        ("asset_id".to_string(), inv.asset_id.to_string()),
    ]);
    for (field, cents) in Amounts::FIELDS.iter().zip(inv.amounts.values()) {
        form.insert(field.to_string(), cents_to_decimal(cents).to_string());
    }
    form
}

pub fn update(conn: &Connection, id: i64, changes: &FormData) -> Result<Investment, ActionError> {
    let current = get(conn, id)?;
    let form = merge(current_form(&current), changes);
    let input = validate(conn, Some(id), &form)?;
    let (year, month) = year_month(input.date);
    let a = input.amounts;
    conn.execute(
        "UPDATE investments SET date=?1, year=?2, month=?3, client_id=?4, bank_id=?5,
            asset_id=?6, previous_balance=?7, monthly_yield=?8, dividends=?9, applied=?10,
            redeemed=?11, incurred_tax=?12, projected_tax=?13, gross_balance=?14,
            net_balance=?15
         WHERE id=?16",
        params![
            input.date,
            year,
            month,
            input.client_id,
            input.bank_id,
            input.asset_id,
            a.previous_balance,
            a.monthly_yield,
            a.dividends,
            a.applied,
            a.redeemed,
            a.incurred_tax,
            a.projected_tax,
            a.gross_balance,
            a.net_balance,
            id
        ],
    )?;
    tracing::info!(id, year, month, "investment updated");
    Ok(into_investment(id, input))
}

pub fn delete(conn: &Connection, id: i64) -> Result<(), ActionError> {
    if conn.execute("DELETE FROM investments WHERE id=?1", params![id])? == 0 {
        return Err(ActionError::not_found("Investment", id));
    }
    tracing::info!(id, "investment deleted");
    Ok(())
}

/// One page of filtered rows, client first then newest period.
pub fn list(
    conn: &Connection,
    filter: &InvestmentFilter,
    page: u32,
) -> Result<Page<ListedInvestment>, ActionError> {
    let predicate: Predicate = filter.predicate(conn)?;
    let total = count_rows(conn, &predicate)?;
    let rows = fetch_rows(conn, &predicate, Some(page_window(page, PAGE_SIZE)))?;
    let items = rows
        .into_iter()
        .map(|row| ListedInvestment {
            metrics: row.metrics(),
            row,
        })
        .collect();
    Ok(Page::new(items, page.max(1), total, PAGE_SIZE))
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let form = form_from_matches(sub, &fields());
            let inv = submit(create(conn, &form), &form)?;
            println!(
                "Added investment {} for {}-{:02}",
                inv.id, inv.year, inv.month
            );
        }
        Some(("edit", sub)) => {
            let id = id_arg(sub)?;
            let form = form_from_matches(sub, &fields());
            let inv = submit(update(conn, id, &form), &form)?;
            println!(
                "Updated investment {} ({}-{:02})",
                inv.id, inv.year, inv.month
            );
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            submit(delete(conn, id), &FormData::new())?;
            println!("Removed investment {}", id);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let form = form_from_matches(sub, &FILTER_FIELDS);
            let filter = submit(InvestmentFilter::from_form(&form), &form)?;
            let page = submit(list(conn, &filter, page_arg(sub)), &form)?;
            if !maybe_print_json(json_flag, jsonl_flag, &page.items)? {
                let cfg = DisplayConfig::load(conn)?;
                let data = page
                    .items
                    .iter()
                    .map(|item| {
                        let r = &item.row;
                        vec![
                            r.id.to_string(),
                            format_date(r.date, &cfg),
                            r.client.clone(),
                            r.bank.clone(),
                            r.asset.clone(),
                            format_cents(r.amounts.previous_balance, &cfg),
                            format_cents(r.amounts.monthly_yield, &cfg),
                            format_cents(r.amounts.dividends, &cfg),
                            format_cents(r.amounts.gross_balance, &cfg),
                            format_cents(r.amounts.net_balance, &cfg),
                            format_rate(item.metrics.growth, &cfg),
                            format_rate(item.metrics.yield_rate, &cfg),
                            format_rate(item.metrics.dividend_rate, &cfg),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &[
                            "ID", "Date", "Client", "Bank", "Asset", "Previous", "Yield",
                            "Dividends", "Gross", "Net", "Growth %", "Yield %", "Div %",
                        ],
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
