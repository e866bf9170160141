// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::DisplayConfig;
use crate::error::ActionError;
use crate::format::{format_cents, format_rate, period_label};
use crate::forms::{FormData, form_from_matches};
use crate::reporting::filters::FILTER_FIELDS;
use crate::reporting::{
    InvestmentFilter, InvestmentReport, InvestmentRow, PeriodPoint, Predicate, Slice,
    SnapshotPolicy, aggregate, by_bank, by_category, fetch_rows, latest_period, monthly_series,
};
use crate::utils::{json_flags, maybe_print_json, pretty_table, submit};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

/// What a diversification chart is split by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Category,
    Bank,
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" => Ok(Dimension::Category),
            "bank" => Ok(Dimension::Bank),
            other => Err(format!("Unknown dimension '{}'", other)),
        }
    }
}

/// Dashboard cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub clients: i64,
    pub invoices: i64,
    pub paid: i64,
    pub pending: i64,
    /// Most recent (year, month) with investment records.
    pub latest_period: Option<(i32, u32)>,
    pub latest_gross: i64,
}

/// Every investment row the filter selects.
pub fn load_rows(conn: &Connection, filter: &InvestmentFilter) -> Result<Vec<InvestmentRow>, ActionError> {
    let predicate: Predicate = filter.predicate(conn)?;
    Ok(fetch_rows(conn, &predicate, None)?)
}

pub fn totals(conn: &Connection, filter: &InvestmentFilter) -> Result<InvestmentReport, ActionError> {
    let rows = load_rows(conn, filter)?;
    Ok(aggregate(&rows))
}

/// Gross balance split by category or bank. `policy` defaults to the
/// latest period unless the filter pins a month.
pub fn diversification(
    conn: &Connection,
    filter: &InvestmentFilter,
    dimension: Dimension,
    policy: Option<SnapshotPolicy>,
) -> Result<Vec<Slice>, ActionError> {
    let rows = load_rows(conn, filter)?;
    let policy = policy.unwrap_or_else(|| SnapshotPolicy::default_for(filter));
    tracing::debug!(?dimension, %policy, rows = rows.len(), "diversification");
    Ok(match dimension {
        Dimension::Category => by_category(&rows, policy),
        Dimension::Bank => by_bank(&rows, policy),
    })
}

pub fn performance(conn: &Connection, filter: &InvestmentFilter) -> Result<Vec<PeriodPoint>, ActionError> {
    let rows = load_rows(conn, filter)?;
    Ok(monthly_series(&rows))
}

pub fn summary(conn: &Connection) -> Result<Summary, ActionError> {
    let (clients, invoices, paid, pending): (i64, i64, i64, i64) = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM clients),
                (SELECT COUNT(*) FROM invoices),
                (SELECT IFNULL(SUM(amount), 0) FROM invoices WHERE status='paid'),
                (SELECT IFNULL(SUM(amount), 0) FROM invoices WHERE status='pending')",
        [],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
    )?;
    let rows = load_rows(conn, &InvestmentFilter::default())?;
    let latest = latest_period(&rows);
    let latest_gross: i64 = rows
        .iter()
        .filter(|r| Some((r.year, r.month)) == latest)
        .map(|r| r.amounts.gross_balance)
        .sum();
    Ok(Summary {
        clients,
        invoices,
        paid,
        pending,
        latest_period: latest,
        latest_gross,
    })
}

fn filter_arg(sub: &clap::ArgMatches) -> Result<(InvestmentFilter, FormData)> {
    let form = form_from_matches(sub, &FILTER_FIELDS);
    let filter = submit(InvestmentFilter::from_form(&form), &form)?;
    Ok((filter, form))
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("totals", sub)) => print_totals(conn, sub)?,
        Some(("diversification", sub)) => print_diversification(conn, sub)?,
        Some(("performance", sub)) => print_performance(conn, sub)?,
        Some(("summary", sub)) => print_summary(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn print_totals(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let (filter, form) = filter_arg(sub)?;
    let report = submit(totals(conn, &filter), &form)?;
    if maybe_print_json(json_flag, jsonl_flag, &report)? {
        return Ok(());
    }
    let cfg = DisplayConfig::load(conn)?;
    let money_row = |label: Vec<String>, values: [i64; 9]| {
        let mut row = label;
        row.extend(values.iter().map(|c| format_cents(*c, &cfg)));
        row
    };
    let mut data = Vec::with_capacity(report.groups.len() + 1);
    for g in &report.groups {
        let mut row = money_row(
            vec![
                g.key.client.clone(),
                period_label(g.key.year, g.key.month),
                g.records.to_string(),
            ],
            g.amounts.values(),
        );
        row.push(format_rate(g.metrics.growth, &cfg));
        row.push(format_rate(g.metrics.yield_rate, &cfg));
        row.push(format_rate(g.metrics.dividend_rate, &cfg));
        data.push(row);
    }
    let records: usize = report.groups.iter().map(|g| g.records).sum();
    let mut total = money_row(
        vec!["TOTAL".into(), String::new(), records.to_string()],
        report.total.values(),
    );
    total.push(format_rate(report.total_metrics.growth, &cfg));
    total.push(format_rate(report.total_metrics.yield_rate, &cfg));
    total.push(format_rate(report.total_metrics.dividend_rate, &cfg));
    data.push(total);

    let mut headers = vec!["Client", "Period", "Records"];
    headers.extend(crate::reporting::Amounts::LABELS);
    headers.extend(["Growth %", "Yield %", "Div %"]);
    println!("{}", pretty_table(&headers, data));
    Ok(())
}

fn print_diversification(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let (filter, form) = filter_arg(sub)?;
    let dimension: Dimension = sub
        .get_one::<String>("by")
        .map(|s| s.parse())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or(Dimension::Category);
    let policy = match sub.get_one::<String>("snapshot").map(String::as_str) {
        None | Some("auto") => None,
        Some(s) => Some(s.parse::<SnapshotPolicy>().map_err(anyhow::Error::msg)?),
    };
    let slices = submit(diversification(conn, &filter, dimension, policy), &form)?;
    if maybe_print_json(json_flag, jsonl_flag, &slices)? {
        return Ok(());
    }
    let cfg = DisplayConfig::load(conn)?;
    let data = slices
        .iter()
        .map(|s| {
            vec![
                s.label.clone(),
                format_cents(s.value, &cfg),
                format_rate(Some(s.share), &cfg),
            ]
        })
        .collect();
    let label = match dimension {
        Dimension::Category => "Category",
        Dimension::Bank => "Bank",
    };
    println!("{}", pretty_table(&[label, "Gross", "Share"], data));
    Ok(())
}

fn print_performance(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let (filter, form) = filter_arg(sub)?;
    let points = submit(performance(conn, &filter), &form)?;
    if maybe_print_json(json_flag, jsonl_flag, &points)? {
        return Ok(());
    }
    let cfg = DisplayConfig::load(conn)?;
    let data = points
        .iter()
        .map(|p| {
            vec![
                period_label(p.year, p.month),
                format_cents(p.amounts.gross_balance, &cfg),
                format_cents(p.amounts.net_balance, &cfg),
                format_cents(p.amounts.monthly_yield, &cfg),
                format_rate(p.change, &cfg),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Period", "Gross", "Net", "Yield", "Change"], data)
    );
    Ok(())
}

fn print_summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let s = submit(summary(conn), &FormData::new())?;
    if maybe_print_json(json_flag, jsonl_flag, &s)? {
        return Ok(());
    }
    let cfg = DisplayConfig::load(conn)?;
    let period = s
        .latest_period
        .map(|(y, m)| period_label(y, m))
        .unwrap_or_else(|| "-".into());
    let data = vec![
        vec!["Clients".into(), s.clients.to_string()],
        vec!["Invoices".into(), s.invoices.to_string()],
        vec!["Paid".into(), format_cents(s.paid, &cfg)],
        vec!["Pending".into(), format_cents(s.pending, &cfg)],
        vec![format!("Gross balance ({})", period), format_cents(s.latest_gross, &cfg)],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], data));
    Ok(())
}
