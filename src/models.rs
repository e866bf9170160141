// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub type_id: Option<i64>,
    pub category_ids: Vec<i64>, // insertion order, first one wins in reports
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub client_id: i64,
    pub bank_id: i64,
    pub asset_id: i64,
    pub amounts: crate::reporting::Amounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub client_id: i64,
    pub amount: i64, // cents
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub const ALL: [&'static str; 2] = ["pending", "paid"];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            other => Err(format!("Unknown invoice status '{}'", other)),
        }
    }
}

/// One page of rows from a list query.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, total_rows: i64, page_size: u32) -> Self {
        Page {
            items,
            page,
            total_pages: total_pages(total_rows, page_size),
        }
    }
}

pub fn total_pages(total_rows: i64, page_size: u32) -> u32 {
    if total_rows <= 0 || page_size == 0 {
        return 0;
    }
    let size = i64::from(page_size);
    ((total_rows + size - 1) / size) as u32
}

/// SQL `LIMIT`/`OFFSET` pair for a 1-based page number.
pub fn page_window(page: u32, page_size: u32) -> (i64, i64) {
    let page = page.max(1);
    (
        i64::from(page_size),
        i64::from(page - 1) * i64::from(page_size),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn page_window_clamps_to_first_page() {
        assert_eq!(page_window(0, 20), (20, 0));
        assert_eq!(page_window(3, 20), (20, 40));
    }

    #[test]
    fn invoice_status_parses_case_insensitively() {
        assert_eq!(" PAID ".parse::<InvoiceStatus>(), Ok(InvoiceStatus::Paid));
        assert!("late".parse::<InvoiceStatus>().is_err());
    }
}
