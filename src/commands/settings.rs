// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{DisplayConfig, set_setting};
use crate::forms::form_from_matches;
use crate::utils::{pretty_table, submit};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let cfg = DisplayConfig::load(conn)?;
            let data = cfg
                .entries()
                .into_iter()
                .map(|(k, v)| vec![k.to_string(), v])
                .collect();
            println!("{}", pretty_table(&["Key", "Value"], data));
        }
        Some(("set", sub)) => {
            let form = form_from_matches(sub, &["key", "value"]);
            let key = form.get("key").cloned().unwrap_or_default();
            let value = form.get("value").cloned().unwrap_or_default();
            submit(set_setting(conn, &key, &value), &form)?;
            println!("Set {} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
