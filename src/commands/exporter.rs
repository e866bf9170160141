// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::format::cents_to_decimal;
use crate::forms::form_from_matches;
use crate::reporting::InvestmentFilter;
use crate::reporting::filters::FILTER_FIELDS;
use crate::utils::submit;
use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use serde_json::json;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("investments", sub)) => {
            let fmt = sub
                .get_one::<String>("format")
                .context("Missing --format")?
                .to_lowercase();
            let out = sub.get_one::<String>("out").context("Missing --out")?;
            let form = form_from_matches(sub, &FILTER_FIELDS);
            let filter = submit(InvestmentFilter::from_form(&form), &form)?;
            let n = export_investments(conn, &filter, &fmt, Path::new(out))?;
            println!("Exported {} investments to {}", n, out);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Write the filtered investment rows as `csv` or `json`; amounts are
/// plain decimals. Returns the number of rows written.
pub fn export_investments(
    conn: &Connection,
    filter: &InvestmentFilter,
    fmt: &str,
    out: &Path,
) -> Result<usize> {
    let rows = super::reports::load_rows(conn, filter)?;

    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)
                .with_context(|| format!("Create {}", out.display()))?;
            let mut header = vec![
                "id", "date", "year", "month", "client", "bank", "asset", "type", "category",
            ];
            header.extend(crate::reporting::Amounts::FIELDS);
            wtr.write_record(&header)?;
            for r in &rows {
                let mut record = vec![
                    r.id.to_string(),
                    r.date.format("%Y-%m-%d").to_string(),
                    r.year.to_string(),
                    r.month.to_string(),
                    r.client.clone(),
                    r.bank.clone(),
                    r.asset.clone(),
                    r.asset_type.clone().unwrap_or_default(),
                    r.category.clone().unwrap_or_default(),
                ];
                record.extend(
                    r.amounts
                        .values()
                        .iter()
                        .map(|c| cents_to_decimal(*c).to_string()),
                );
                wtr.write_record(&record)?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = rows
                .iter()
                .map(|r| {
                    let mut item = json!({
                        "id": r.id,
                        "date": r.date,
                        "year": r.year,
                        "month": r.month,
                        "client": r.client,
                        "bank": r.bank,
                        "asset": r.asset,
                        "type": r.asset_type,
                        "category": r.category,
                    });
                    for (field, cents) in crate::reporting::Amounts::FIELDS
                        .iter()
                        .zip(r.amounts.values())
                    {
                        item[*field] = json!(cents_to_decimal(cents));
                    }
                    item
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Write {}", out.display()))?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    tracing::info!(rows = rows.len(), fmt, path = %out.display(), "investments exported");
    Ok(rows.len())
}
