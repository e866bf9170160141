// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::forms::FormData;
use rusqlite::ErrorCode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Generic message shown for persistence failures; the details go to the log.
pub const STORE_FAILURE: &str = "Database Error: operation failed.";

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in self.iter() {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Missing or invalid fields: {0}")]
    Validation(FieldErrors),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{message}")]
    Conflict { field: &'static str, message: String },

    #[error("Database Error: operation failed.")]
    Store(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for ActionError {
    fn from(err: rusqlite::Error) -> Self {
        tracing::error!(error = %err, "store operation failed");
        ActionError::Store(err)
    }
}

impl ActionError {
    /// Validation failure on a single field.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        ActionError::Validation(errors)
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ActionError::NotFound { entity, id }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ActionError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Turn the failure into the state a form re-renders with.
    pub fn into_state(self, values: FormData) -> ActionState {
        let (message, errors) = match self {
            ActionError::Validation(errors) => (
                "Missing or invalid fields. Failed to save.".to_string(),
                errors,
            ),
            ActionError::Conflict { field, message } => {
                let mut errors = FieldErrors::default();
                errors.add(field, message.clone());
                (message, errors)
            }
            ActionError::NotFound { entity, id } => (
                format!("{} {} not found.", entity, id),
                FieldErrors::default(),
            ),
            ActionError::Store(_) => (STORE_FAILURE.to_string(), FieldErrors::default()),
        };
        ActionState {
            message: Some(message),
            errors,
            values,
        }
    }
}

/// What a form shows after a failed submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionState {
    pub message: Option<String>,
    pub errors: FieldErrors,
    pub values: FormData,
}

pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

pub trait ConstraintExt<T> {
    /// Map a UNIQUE / FOREIGN KEY violation to a field-specific conflict.
    fn or_conflict(self, field: &'static str, message: &str) -> Result<T, ActionError>;
}

impl<T> ConstraintExt<T> for rusqlite::Result<T> {
    fn or_conflict(self, field: &'static str, message: &str) -> Result<T, ActionError> {
        self.map_err(|err| {
            if is_constraint_violation(&err) {
                tracing::debug!(field, error = %err, "constraint violation");
                ActionError::Conflict {
                    field,
                    message: message.to_string(),
                }
            } else {
                ActionError::from(err)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE banks(id INTEGER PRIMARY KEY, name TEXT UNIQUE);")
            .unwrap();
        conn.execute("INSERT INTO banks(name) VALUES ('Itau')", [])
            .unwrap();
        let err = conn
            .execute("INSERT INTO banks(name) VALUES ('Itau')", [])
            .or_conflict("name", "Bank already exists.")
            .unwrap_err();
        match err {
            ActionError::Conflict { field, message } => {
                assert_eq!(field, "name");
                assert_eq!(message, "Bank already exists.");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn other_store_errors_stay_generic() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .execute("INSERT INTO missing(name) VALUES ('x')", [])
            .or_conflict("name", "dup")
            .unwrap_err();
        assert!(matches!(err, ActionError::Store(_)));
        let state = err.into_state(FormData::new());
        assert_eq!(state.message.as_deref(), Some(STORE_FAILURE));
        assert!(state.errors.is_empty());
    }

    #[test]
    fn validation_state_keeps_submitted_values() {
        let mut values = FormData::new();
        values.insert("name".into(), "".into());
        let state = ActionError::invalid("name", "Please enter a name.").into_state(values);
        assert_eq!(
            state.errors.get("name"),
            Some(&["Please enter a name.".to_string()][..])
        );
        assert_eq!(state.values.get("name").map(String::as_str), Some(""));
    }
}
