// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use investboard::commands::reports::{self, Dimension};
use investboard::commands::{doctor, settings};
use investboard::config::{DisplayConfig, Locale};
use investboard::forms::FormData;
use investboard::reporting::diversification::UNCATEGORIZED;
use investboard::reporting::{InvestmentFilter, SnapshotPolicy};
use investboard::{cli, db};
use rust_decimal::Decimal;
use rusqlite::Connection;

// Robson holds a CDB (Renda Fixa) at Itau and PETR4 (Acoes) at XP, plus an
// uncategorized fund at XP in February only.
fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO clients(id, name, email) VALUES (1, 'Robson', 'robson@example.com');
        INSERT INTO banks(id, name) VALUES (1, 'Itau'), (2, 'XP');
        INSERT INTO categories(id, name) VALUES (1, 'Renda Fixa'), (2, 'Acoes');
        INSERT INTO assets(id, name) VALUES (1, 'CDB'), (2, 'PETR4'), (3, 'Fundo');
        INSERT INTO asset_categories(asset_id, category_id) VALUES (1, 1), (2, 2);
        INSERT INTO invoices(client_id, amount, status, date) VALUES
            (1, 15000, 'paid', '2024-01-10'),
            (1, 5000, 'pending', '2024-02-10');
        INSERT INTO investments(date, year, month, client_id, bank_id, asset_id,
                                previous_balance, monthly_yield, gross_balance, net_balance) VALUES
            ('2024-02-29', 2024, 2, 1, 1, 1, 100000, 1000, 101000, 100800),
            ('2024-02-29', 2024, 2, 1, 2, 2, 60000, 0, 60000, 60000),
            ('2024-02-29', 2024, 2, 1, 2, 3, 0, 0, 40000, 40000),
            ('2024-03-31', 2024, 3, 1, 1, 1, 101000, 1100, 102100, 101900),
            ('2024-03-31', 2024, 3, 1, 2, 2, 60000, -3000, 57000, 57000);
        "#,
    )
    .unwrap();
    conn
}

#[test]
fn diversification_uses_latest_period_by_default() {
    let conn = setup();
    let slices = reports::diversification(
        &conn,
        &InvestmentFilter::default(),
        Dimension::Category,
        None,
    )
    .unwrap();
    let labels: Vec<_> = slices.iter().map(|s| (s.label.as_str(), s.value)).collect();
    assert_eq!(labels, vec![("Renda Fixa", 102100), ("Acoes", 57000)]);
    let shares: Decimal = slices.iter().map(|s| s.share).sum();
    assert_eq!(shares.round_dp(10), Decimal::ONE);
}

#[test]
fn diversification_over_all_periods_and_by_bank() {
    let conn = setup();
    let by_category = reports::diversification(
        &conn,
        &InvestmentFilter::default(),
        Dimension::Category,
        Some(SnapshotPolicy::All),
    )
    .unwrap();
    assert!(by_category.iter().any(|s| s.label == UNCATEGORIZED && s.value == 40000));

    // pinning a month switches the default to every row of that month
    let mut feb = InvestmentFilter::default();
    feb.month = Some(2);
    let by_bank = reports::diversification(&conn, &feb, Dimension::Bank, None).unwrap();
    let labels: Vec<_> = by_bank.iter().map(|s| (s.label.as_str(), s.value)).collect();
    assert_eq!(labels, vec![("Itau", 101000), ("XP", 100000)]);
}

#[test]
fn performance_series_is_chronological() {
    let conn = setup();
    let points = reports::performance(&conn, &InvestmentFilter::default()).unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!((points[0].year, points[0].month), (2024, 2));
    assert_eq!(points[0].amounts.gross_balance, 201000);
    assert_eq!(points[0].change, None);
    assert_eq!(points[1].amounts.gross_balance, 159100);
    assert!(points[1].change.unwrap() < Decimal::ZERO);
}

#[test]
fn summary_cards() {
    let conn = setup();
    let s = reports::summary(&conn).unwrap();
    assert_eq!((s.clients, s.invoices), (1, 2));
    assert_eq!((s.paid, s.pending), (15000, 5000));
    assert_eq!(s.latest_period, Some((2024, 3)));
    assert_eq!(s.latest_gross, 159100);
}

#[test]
fn report_cli_parses_filters_and_policy() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "investboard",
        "report",
        "diversification",
        "--by",
        "bank",
        "--snapshot",
        "all",
        "--json",
    ]);
    let Some(("report", report_m)) = matches.subcommand() else {
        panic!("no report subcommand");
    };
    reports::handle(&conn, report_m).unwrap();

    let bad = cli::build_cli().try_get_matches_from([
        "investboard",
        "report",
        "diversification",
        "--snapshot",
        "yesterday",
    ]);
    assert!(bad.is_err());
}

#[test]
fn config_set_changes_display_settings() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "investboard",
        "config",
        "set",
        "--key",
        "locale",
        "--value",
        "en-US",
    ]);
    let Some(("config", config_m)) = matches.subcommand() else {
        panic!("no config subcommand");
    };
    settings::handle(&conn, config_m).unwrap();
    assert_eq!(DisplayConfig::load(&conn).unwrap().locale, Locale::EnUs);

    let err = investboard::config::set_setting(&conn, "percent_decimals", "x").unwrap_err();
    assert_eq!(
        err.into_state(FormData::new()).errors.get("value").map(|m| m.len()),
        Some(1)
    );
}

#[test]
fn doctor_flags_inconsistent_rows() {
    let conn = setup();
    conn.execute("UPDATE investments SET month=4 WHERE id=1", [])
        .unwrap();
    let issues = doctor::check(&conn).unwrap();
    let kinds: Vec<_> = issues.iter().map(|r| r[0].as_str()).collect();
    assert!(kinds.contains(&"period_mismatch"));
    assert!(kinds.contains(&"asset_without_category"));
    assert!(!kinds.contains(&"category_cycle"));
}
