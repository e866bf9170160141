// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Flat key/value form payloads and the validation rules applied to them.

use crate::error::{ActionError, FieldErrors};
use crate::format::parse_money;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::str::FromStr;

pub type FormData = BTreeMap<String, String>;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

/// Collect the given clap arguments into a trimmed form payload.
/// Arguments the user did not pass are left out.
pub fn form_from_matches(sub: &clap::ArgMatches, fields: &[&str]) -> FormData {
    let mut form = FormData::new();
    for field in fields {
        if let Ok(Some(value)) = sub.try_get_one::<String>(field) {
            form.insert((*field).to_string(), value.trim().to_string());
        }
    }
    form
}

/// Overlay `changes` on top of `current`, as an edit form does.
pub fn merge(mut current: FormData, changes: &FormData) -> FormData {
    for (k, v) in changes {
        current.insert(k.clone(), v.clone());
    }
    current
}

/// Accumulates per-field messages while reading typed values out of a form.
///
/// Every reader returns a placeholder on failure so callers can read all
/// fields first and call [`Validator::finish`] once.
pub struct Validator<'a> {
    form: &'a FormData,
    errors: FieldErrors,
}

impl<'a> Validator<'a> {
    pub fn new(form: &'a FormData) -> Self {
        Validator {
            form,
            errors: FieldErrors::default(),
        }
    }

    /// Trimmed, non-empty value of a field.
    pub fn value(&self, field: &str) -> Option<&'a str> {
        self.form
            .get(field)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.get(field).is_some()
    }

    pub fn required_text(&mut self, field: &str, label: &str, max_len: usize) -> String {
        match self.value(field) {
            None => {
                self.error(field, format!("Please enter {}.", label));
                String::new()
            }
            Some(v) if v.chars().count() > max_len => {
                self.error(
                    field,
                    format!("{} must be at most {} characters.", capitalize(label), max_len),
                );
                String::new()
            }
            Some(v) => v.to_string(),
        }
    }

    pub fn email(&mut self, field: &str) -> String {
        match self.value(field) {
            None => {
                self.error(field, "Please enter an email address.");
                String::new()
            }
            Some(v) if !EMAIL.is_match(v) => {
                self.error(field, "Please enter a valid email address.");
                String::new()
            }
            Some(v) => v.to_lowercase(),
        }
    }

    pub fn required_id(&mut self, field: &str, label: &str) -> i64 {
        match self.value(field) {
            None => {
                self.error(field, format!("Please select {}.", label));
                0
            }
            Some(_) => self.optional_id(field, label).unwrap_or(0),
        }
    }

    pub fn optional_id(&mut self, field: &str, label: &str) -> Option<i64> {
        let raw = self.value(field)?;
        match raw.parse::<i64>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                self.error(field, format!("Invalid {} id '{}'.", label, raw));
                None
            }
        }
    }

    /// Comma-separated list of ids; duplicates are dropped, order is kept.
    pub fn id_list(&mut self, field: &str, label: &str) -> Vec<i64> {
        let Some(raw) = self.value(field) else {
            return Vec::new();
        };
        let mut ids = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.parse::<i64>() {
                Ok(id) if id > 0 => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                _ => self.error(field, format!("Invalid {} id '{}'.", label, part)),
            }
        }
        ids
    }

    /// Money amount in cents. Blank gives `None`.
    pub fn money(&mut self, field: &str, label: &str) -> Option<i64> {
        let raw = self.value(field)?;
        match parse_money(raw) {
            Some(cents) => Some(cents),
            None => {
                self.error(field, format!("Invalid amount '{}' for {}.", raw, label));
                None
            }
        }
    }

    pub fn positive_money(&mut self, field: &str, label: &str) -> i64 {
        if self.value(field).is_none() {
            self.error(field, format!("Please enter {}.", label));
            return 0;
        }
        match self.money(field, label) {
            Some(cents) if cents > 0 => cents,
            Some(_) => {
                self.error(field, "Please enter an amount greater than 0.");
                0
            }
            None => 0,
        }
    }

    pub fn date(&mut self, field: &str, label: &str) -> NaiveDate {
        match self.value(field) {
            None => {
                self.error(field, format!("Please enter {}.", label));
                NaiveDate::MIN
            }
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(d) => d,
                Err(_) => {
                    self.error(
                        field,
                        format!("Invalid date '{}', expected YYYY-MM-DD.", raw),
                    );
                    NaiveDate::MIN
                }
            },
        }
    }

    pub fn choice<T: FromStr>(&mut self, field: &str, label: &str, allowed: &[&str]) -> Option<T> {
        let Some(raw) = self.value(field) else {
            self.error(field, format!("Please select {}.", label));
            return None;
        };
        match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.error(
                    field,
                    format!("Invalid {} '{}', expected one of: {}.", label, raw, allowed.join(", ")),
                );
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ActionError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ActionError::Validation(self.errors))
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn collects_every_field_error() {
        let data = form(&[("name", "  "), ("email", "not-an-email")]);
        let mut v = Validator::new(&data);
        v.required_text("name", "a name", 100);
        v.email("email");
        let err = v.finish().unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.get("name").unwrap(), ["Please enter a name."]);
        assert_eq!(
            errors.get("email").unwrap(),
            ["Please enter a valid email address."]
        );
    }

    #[test]
    fn id_list_keeps_order_and_drops_duplicates() {
        let data = form(&[("categories", "3, 1,3 ,2")]);
        let mut v = Validator::new(&data);
        assert_eq!(v.id_list("categories", "category"), vec![3, 1, 2]);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn money_accepts_both_separator_styles() {
        let data = form(&[("a", "1.234,56"), ("b", "1234.56"), ("c", "abc")]);
        let mut v = Validator::new(&data);
        assert_eq!(v.money("a", "a"), Some(123456));
        assert_eq!(v.money("b", "b"), Some(123456));
        assert_eq!(v.money("c", "c"), None);
        assert!(v.has_error("c"));
    }

    #[test]
    fn positive_money_rejects_zero() {
        let data = form(&[("amount", "0")]);
        let mut v = Validator::new(&data);
        assert_eq!(v.positive_money("amount", "an amount"), 0);
        assert!(v.has_error("amount"));
    }

    #[test]
    fn merge_overlays_changes() {
        let current = form(&[("name", "Old"), ("email", "a@b.co")]);
        let merged = merge(current, &form(&[("name", "New")]));
        assert_eq!(merged["name"], "New");
        assert_eq!(merged["email"], "a@b.co");
    }
}
