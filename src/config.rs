// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ActionError;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const KEY_LOCALE: &str = "locale";
pub const KEY_CURRENCY_SYMBOL: &str = "currency_symbol";
pub const KEY_PERCENT_DECIMALS: &str = "percent_decimals";

pub const KEYS: [&str; 3] = [KEY_LOCALE, KEY_CURRENCY_SYMBOL, KEY_PERCENT_DECIMALS];

/// Separator and date conventions used when rendering values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Locale {
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::PtBr => "pt-BR",
            Locale::EnUs => "en-US",
        }
    }

    pub fn decimal_separator(&self) -> char {
        match self {
            Locale::PtBr => ',',
            Locale::EnUs => '.',
        }
    }

    pub fn group_separator(&self) -> char {
        match self {
            Locale::PtBr => '.',
            Locale::EnUs => ',',
        }
    }

    pub fn date_format(&self) -> &'static str {
        match self {
            Locale::PtBr => "%d/%m/%Y",
            Locale::EnUs => "%m/%d/%Y",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pt-br" => Ok(Locale::PtBr),
            "en-us" => Ok(Locale::EnUs),
            other => Err(format!("Unsupported locale '{}'", other)),
        }
    }
}

/// Display settings, persisted in the `settings` table.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayConfig {
    pub locale: Locale,
    pub currency_symbol: String,
    pub percent_decimals: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            locale: Locale::PtBr,
            currency_symbol: "R$".to_string(),
            percent_decimals: 2,
        }
    }
}

impl DisplayConfig {
    /// Read stored settings, falling back to defaults for anything unset or
    /// unreadable.
    pub fn load(conn: &Connection) -> rusqlite::Result<Self> {
        let mut cfg = DisplayConfig::default();
        if let Some(v) = get_setting(conn, KEY_LOCALE)? {
            match v.parse() {
                Ok(locale) => cfg.locale = locale,
                Err(e) => tracing::warn!(value = %v, "ignoring stored locale: {}", e),
            }
        }
        if let Some(v) = get_setting(conn, KEY_CURRENCY_SYMBOL)? {
            cfg.currency_symbol = v;
        }
        if let Some(v) = get_setting(conn, KEY_PERCENT_DECIMALS)? {
            match v.parse::<u32>() {
                Ok(dp) if dp <= 8 => cfg.percent_decimals = dp,
                _ => tracing::warn!(value = %v, "ignoring stored percent_decimals"),
            }
        }
        Ok(cfg)
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_LOCALE, self.locale.to_string()),
            (KEY_CURRENCY_SYMBOL, self.currency_symbol.clone()),
            (KEY_PERCENT_DECIMALS, self.percent_decimals.to_string()),
        ]
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM settings WHERE key=?1",
        params![key],
        |r| r.get(0),
    )
    .optional()
}

/// Validate and store a display setting.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<(), ActionError> {
    let key = key.trim();
    let value = value.trim();
    let normalized = match key {
        KEY_LOCALE => value
            .parse::<Locale>()
            .map_err(|e| ActionError::invalid("value", e))?
            .to_string(),
        KEY_CURRENCY_SYMBOL => {
            if value.is_empty() || value.chars().count() > 5 {
                return Err(ActionError::invalid(
                    "value",
                    "Currency symbol must be 1 to 5 characters.",
                ));
            }
            value.to_string()
        }
        KEY_PERCENT_DECIMALS => match value.parse::<u32>() {
            Ok(dp) if dp <= 8 => dp.to_string(),
            _ => {
                return Err(ActionError::invalid(
                    "value",
                    "Percent decimals must be a number from 0 to 8.",
                ));
            }
        },
        other => {
            return Err(ActionError::invalid(
                "key",
                format!("Unknown setting '{}', expected one of: {}.", other, KEYS.join(", ")),
            ));
        }
    };
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, normalized],
    )?;
    tracing::info!(key, value = %normalized, "setting updated");
    Ok(())
}
