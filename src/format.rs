// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Display helpers for money, rates, dates and page navigation.

use crate::config::{DisplayConfig, Locale};
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;

fn group_digits(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, ch) in digits.chars().enumerate() {
        out.push(ch);
        let remaining = len - i - 1;
        if remaining > 0 && remaining % 3 == 0 {
            out.push(sep);
        }
    }
    out
}

/// Format integer cents as a currency string, e.g. `R$ 1.234,56` (pt-BR)
/// or `$1,234.56` (en-US). The minus sign precedes the symbol.
pub fn format_cents(cents: i64, cfg: &DisplayConfig) -> String {
    let abs = cents.unsigned_abs();
    let int_part = group_digits(&(abs / 100).to_string(), cfg.locale.group_separator());
    let mut out = String::new();
    if cents < 0 {
        out.push('-');
    }
    out.push_str(&cfg.currency_symbol);
    if cfg.locale == Locale::PtBr && !cfg.currency_symbol.is_empty() {
        out.push(' ');
    }
    out.push_str(&int_part);
    out.push(cfg.locale.decimal_separator());
    out.push_str(&format!("{:02}", abs % 100));
    out
}

/// Format a stored textual amount; malformed input renders as zero.
pub fn format_cents_str(raw: &str, cfg: &DisplayConfig) -> String {
    format_cents(parse_money(raw).unwrap_or(0), cfg)
}

/// Parse a money string into cents.
///
/// Accepts an optional currency symbol, one minus sign before or right after
/// the symbol, grouping separators and either `,` or `.` as the decimal
/// separator. When both appear, the last one is the decimal separator. A lone
/// separator followed by exactly three digits is treated as grouping. Groups
/// after the first must have exactly three digits, and more than two
/// fraction digits is rejected.
pub fn parse_money(raw: &str) -> Option<i64> {
    let mut rest = raw.trim();
    let mut negative = false;
    if let Some(r) = rest.strip_prefix('-') {
        negative = true;
        rest = r.trim_start();
    }
    rest = strip_symbol(rest).trim_start();
    if !negative && rest.starts_with('-') {
        negative = true;
        rest = &rest[1..];
    }
    if !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == ',')
        || !rest
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        || !rest.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }

    let last_dot = rest.rfind('.');
    let last_comma = rest.rfind(',');
    let decimal_at = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(d.max(c)),
        (Some(p), None) | (None, Some(p)) => {
            let sep = rest.as_bytes()[p] as char;
            let count = rest.matches(sep).count();
            let trailing = rest.len() - p - 1;
            if count > 1 || trailing == 3 { None } else { Some(p) }
        }
        (None, None) => None,
    };

    let (int_raw, frac_raw) = match decimal_at {
        Some(p) => (&rest[..p], &rest[p + 1..]),
        None => (rest, ""),
    };
    if (decimal_at.is_some() && frac_raw.is_empty())
        || frac_raw.len() > 2
        || !frac_raw.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let int_digits = ungroup(int_raw)?;
    let int_value: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().ok()?
    };
    let frac_value: i64 = match frac_raw.len() {
        0 => 0,
        1 => frac_raw.parse::<i64>().ok()? * 10,
        _ => frac_raw.parse().ok()?,
    };
    let cents = int_value.checked_mul(100)?.checked_add(frac_value)?;
    Some(if negative { -cents } else { cents })
}

const SYMBOLS: [&str; 5] = ["US$", "R$", "$", "€", "£"];

fn strip_symbol(s: &str) -> &str {
    for sym in SYMBOLS {
        match s.get(..sym.len()) {
            Some(head) if head.eq_ignore_ascii_case(sym) => return &s[sym.len()..],
            _ => {}
        }
    }
    s
}

// Integer digits with a single kind of grouping separator removed; `None`
// when the groups are not 1-3 digits followed by runs of exactly three.
fn ungroup(int_raw: &str) -> Option<String> {
    let sep = match (int_raw.contains('.'), int_raw.contains(',')) {
        (false, false) => return Some(int_raw.to_string()),
        (true, true) => return None,
        (true, false) => '.',
        (false, true) => ',',
    };
    let mut groups = int_raw.split(sep);
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 {
        return None;
    }
    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

/// Cents to a `Decimal` amount, e.g. 123456 -> 1234.56.
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Format a fraction as a percentage with a fixed number of decimals.
/// A missing rate (zero base) renders as `-`.
pub fn format_rate(rate: Option<Decimal>, cfg: &DisplayConfig) -> String {
    match rate {
        None => "-".to_string(),
        Some(r) => {
            let pct = (r * Decimal::ONE_HUNDRED).round_dp_with_strategy(
                cfg.percent_decimals,
                RoundingStrategy::MidpointAwayFromZero,
            );
            let s = format!("{:.*}", cfg.percent_decimals as usize, pct);
            let s = if cfg.locale.decimal_separator() == ',' {
                s.replace('.', ",")
            } else {
                s
            };
            format!("{}%", s)
        }
    }
}

pub fn format_date(date: NaiveDate, cfg: &DisplayConfig) -> String {
    date.format(cfg.locale.date_format()).to_string()
}

pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// `YYYY-MM` label for a period.
pub fn period_label(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl fmt::Display for PageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageItem::Page(n) => write!(f, "{}", n),
            PageItem::Ellipsis => f.write_str("..."),
        }
    }
}

/// Page numbers to show in a pager. Up to seven pages are listed in full;
/// beyond that the first and last page are always present and gaps become
/// ellipses around the current page.
pub fn pagination_range(current: u32, total: u32) -> Vec<PageItem> {
    use PageItem::{Ellipsis, Page};

    if total <= 7 {
        return (1..=total).map(Page).collect();
    }
    let current = current.clamp(1, total);
    if current <= 3 {
        return vec![Page(1), Page(2), Page(3), Ellipsis, Page(total - 1), Page(total)];
    }
    if current >= total - 2 {
        return vec![
            Page(1),
            Page(2),
            Ellipsis,
            Page(total - 2),
            Page(total - 1),
            Page(total),
        ];
    }
    vec![
        Page(1),
        Ellipsis,
        Page(current - 1),
        Page(current),
        Page(current + 1),
        Ellipsis,
        Page(total),
    ]
}

pub fn render_pager(current: u32, total: u32) -> String {
    pagination_range(current, total)
        .into_iter()
        .map(|item| match item {
            PageItem::Page(n) if n == current => format!("[{}]", n),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
