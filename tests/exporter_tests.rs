// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use investboard::{cli, commands::exporter, db};
use rusqlite::Connection;
use serde_json::json;
use tempfile::tempdir;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO clients(id, name, email) VALUES (1, 'Robson', 'robson@example.com');
        INSERT INTO clients(id, name, email) VALUES (2, 'Maria', 'maria@example.com');
        INSERT INTO banks(id, name) VALUES (1, 'Itau');
        INSERT INTO asset_types(id, name) VALUES (1, 'Renda Fixa');
        INSERT INTO categories(id, name) VALUES (1, 'Pos-fixado');
        INSERT INTO assets(id, name, type_id) VALUES (1, 'CDB', 1);
        INSERT INTO asset_categories(asset_id, category_id) VALUES (1, 1);
        INSERT INTO investments(date, year, month, client_id, bank_id, asset_id,
                                previous_balance, monthly_yield, gross_balance, net_balance) VALUES
            ('2024-03-31', 2024, 3, 1, 1, 1, 100000, -1234, 98766, 98000),
            ('2024-03-31', 2024, 3, 2, 1, 1, 5000, 0, 5000, 5000);
        "#,
    )
    .unwrap();
    conn
}

fn run_export(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["investboard", "export", "investments"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, export_m)
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_investments_writes_filtered_json() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    run_export(
        &conn,
        &["--format", "json", "--out", &out_str, "--client", "robson"],
    )
    .unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "id": 1,
                "date": "2024-03-31",
                "year": 2024,
                "month": 3,
                "client": "Robson",
                "bank": "Itau",
                "asset": "CDB",
                "type": "Renda Fixa",
                "category": "Pos-fixado",
                "previous_balance": "1000.00",
                "monthly_yield": "-12.34",
                "dividends": "0.00",
                "applied": "0.00",
                "redeemed": "0.00",
                "incurred_tax": "0.00",
                "projected_tax": "0.00",
                "gross_balance": "987.66",
                "net_balance": "980.00"
            }
        ])
    );
}

#[test]
fn export_investments_writes_csv_with_header() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    run_export(&conn, &["--format", "csv", "--out", &out_str]).unwrap();

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "id");
    assert_eq!(&headers[9], "previous_balance");
    let records: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 2);
    // Maria sorts first
    assert_eq!(&records[0][4], "Maria");
    assert_eq!(&records[1][10], "-12.34");
}

#[test]
fn export_rejects_unknown_format() {
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.xml");
    let out_str = out_path.to_string_lossy().to_string();
    let parsed = cli::build_cli().try_get_matches_from([
        "investboard",
        "export",
        "investments",
        "--format",
        "xml",
        "--out",
        &out_str,
    ]);
    assert!(parsed.is_err());

    let conn = base_conn();
    let filter = investboard::reporting::InvestmentFilter::default();
    assert!(exporter::export_investments(&conn, &filter, "xml", &out_path).is_err());
    assert!(!out_path.exists());
}
