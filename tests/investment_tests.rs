// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use investboard::commands::{assets, clients, investments, lookups, reports};
use investboard::error::ActionError;
use investboard::forms::{FormData, form_from_matches};
use investboard::reporting::filters::FILTER_FIELDS;
use investboard::reporting::{Amounts, Clause, InvestmentFilter};
use investboard::{cli, db};
use rust_decimal::Decimal;
use rusqlite::{Connection, params};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO clients(id, name, email) VALUES (1, 'Robson', 'robson@example.com');
        INSERT INTO clients(id, name, email) VALUES (2, 'Maria', 'maria@example.com');
        INSERT INTO banks(id, name) VALUES (1, 'Itau');
        INSERT INTO banks(id, name) VALUES (2, 'XP');
        INSERT INTO assets(id, name) VALUES (1, 'CDB');
        INSERT INTO assets(id, name) VALUES (2, 'LCI');
        "#,
    )
    .unwrap();
    conn
}

fn form(pairs: &[(&str, &str)]) -> FormData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn record(conn: &Connection, date: &str, client: i64, bank: i64, asset: i64, prev: i64, yld: i64, gross: i64) {
    let year: i32 = date[..4].parse().unwrap();
    let month: u32 = date[5..7].parse().unwrap();
    conn.execute(
        "INSERT INTO investments(date, year, month, client_id, bank_id, asset_id,
            previous_balance, monthly_yield, gross_balance, net_balance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![date, year, month, client, bank, asset, prev, yld, gross],
    )
    .unwrap();
}

fn filter_from_cli(args: &[&str]) -> InvestmentFilter {
    let mut argv = vec!["investboard", "inv", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("investment", inv_m)) = matches.subcommand() else {
        panic!("no investment subcommand");
    };
    let Some(("list", list_m)) = inv_m.subcommand() else {
        panic!("no list subcommand");
    };
    InvestmentFilter::from_form(&form_from_matches(list_m, &FILTER_FIELDS)).unwrap()
}

#[test]
fn robson_march_filter_yields_one_group() {
    let conn = setup();
    record(&conn, "2024-03-31", 1, 1, 1, 100000, 1000, 101000);
    record(&conn, "2024-03-31", 1, 2, 2, 50000, 500, 50500);
    record(&conn, "2024-02-29", 1, 1, 1, 99000, 1000, 100000);
    record(&conn, "2024-03-31", 2, 1, 1, 70000, 700, 70700);

    let filter = filter_from_cli(&["--client", "Robson", "--year", "2024", "--month", "03"]);
    let predicate = filter.predicate(&conn).unwrap();
    assert_eq!(
        predicate.clauses(),
        &[
            Clause::ClientName("Robson".into()),
            Clause::Year(2024),
            Clause::Month(3),
        ]
    );

    let report = reports::totals(&conn, &filter).unwrap();
    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!((group.key.client.as_str(), group.key.year, group.key.month), ("Robson", 2024, 3));
    assert_eq!(group.records, 2);
    assert_eq!(group.amounts.gross_balance, 151500);
    assert_eq!(report.total, group.amounts);
    assert_eq!(report.total_metrics.yield_rate, Some(Decimal::new(1, 2)));
}

#[test]
fn group_totals_add_up_to_grand_total() {
    let conn = setup();
    record(&conn, "2024-01-31", 1, 1, 1, 100000, 900, 100900);
    record(&conn, "2024-02-29", 1, 1, 1, 100900, 1100, 102000);
    record(&conn, "2024-02-29", 2, 2, 2, 0, 0, 30000);
    record(&conn, "2024-02-29", 2, 1, 1, 40000, -200, 39800);

    let report = reports::totals(&conn, &InvestmentFilter::default()).unwrap();
    assert_eq!(report.groups.len(), 3);
    let summed: Amounts = report.groups.iter().map(|g| g.amounts).sum();
    assert_eq!(summed, report.total);
    assert_eq!(
        report.groups.iter().map(|g| g.records).sum::<usize>(),
        4
    );
}

#[test]
fn blank_previous_balance_carries_forward() {
    let conn = setup();
    investments::create(
        &conn,
        &form(&[
            ("date", "2024-02-29"),
            ("client_id", "1"),
            ("bank_id", "1"),
            ("asset_id", "1"),
            ("previous_balance", "0"),
            ("applied", "1.000,00"),
            ("gross_balance", "1.005,00"),
        ]),
    )
    .unwrap();
    let march = investments::create(
        &conn,
        &form(&[
            ("date", "2024-03-31"),
            ("client_id", "1"),
            ("bank_id", "1"),
            ("asset_id", "1"),
            ("monthly_yield", "10,05"),
            ("gross_balance", "1015.05"),
        ]),
    )
    .unwrap();
    assert_eq!((march.year, march.month), (2024, 3));
    assert_eq!(march.amounts.previous_balance, 100500);
    assert_eq!(march.amounts.monthly_yield, 1005);
    assert_eq!(march.amounts.applied, 0);

    // another asset has nothing to carry
    let other = investments::create(
        &conn,
        &form(&[
            ("date", "2024-03-31"),
            ("client_id", "1"),
            ("bank_id", "1"),
            ("asset_id", "2"),
            ("gross_balance", "10"),
        ]),
    )
    .unwrap();
    assert_eq!(other.amounts.previous_balance, 0);
}

#[test]
fn edit_updates_only_given_fields_and_rederives_period() {
    let conn = setup();
    let created = investments::create(
        &conn,
        &form(&[
            ("date", "2024-03-31"),
            ("client_id", "1"),
            ("bank_id", "1"),
            ("asset_id", "1"),
            ("previous_balance", "100"),
            ("gross_balance", "110"),
        ]),
    )
    .unwrap();
    let edited = investments::update(
        &conn,
        created.id,
        &form(&[("date", "2024-04-30"), ("monthly_yield", "-1,50")]),
    )
    .unwrap();
    assert_eq!((edited.year, edited.month), (2024, 4));
    assert_eq!(edited.amounts.previous_balance, 10000);
    assert_eq!(edited.amounts.gross_balance, 11000);
    assert_eq!(edited.amounts.monthly_yield, -150);
}

#[test]
fn invalid_input_is_reported_per_field() {
    let conn = setup();
    let err = investments::create(
        &conn,
        &form(&[
            ("date", "31/03/2024"),
            ("client_id", "9"),
            ("bank_id", "1"),
            ("monthly_yield", "ten"),
        ]),
    )
    .unwrap_err();
    let errors = err.field_errors().unwrap();
    for field in ["date", "client_id", "asset_id", "monthly_yield"] {
        assert!(errors.get(field).is_some(), "no error for {}", field);
    }
    assert!(errors.get("bank_id").is_none());
}

#[test]
fn referenced_banks_and_assets_cannot_be_deleted() {
    let conn = setup();
    record(&conn, "2024-03-31", 1, 1, 1, 0, 0, 100);

    let err = lookups::delete(&conn, &lookups::BANKS, 1).unwrap_err();
    assert!(matches!(err, ActionError::Conflict { .. }));
    let err = assets::delete(&conn, 1).unwrap_err();
    assert!(matches!(err, ActionError::Conflict { .. }));

    lookups::delete(&conn, &lookups::BANKS, 2).unwrap();
    assets::delete(&conn, 2).unwrap();
}

#[test]
fn list_orders_and_pages_with_rates() {
    let conn = setup();
    for month in 1..=12u32 {
        let date = format!("2023-{:02}-28", month);
        record(&conn, &date, 1, 1, 1, 100000, 1000, 101000);
        record(&conn, &date, 2, 1, 1, 0, 0, 5000);
    }
    record(&conn, "2024-01-28", 2, 2, 2, 0, 0, 5000);

    let filter = InvestmentFilter::default();
    let first = investments::list(&conn, &filter, 1).unwrap();
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.items.len(), 20);
    // Maria sorts before Robson, newest period first
    let top = &first.items[0].row;
    assert_eq!((top.client.as_str(), top.year, top.month), ("Maria", 2024, 1));
    assert_eq!(first.items[0].metrics.growth, None);

    let second = investments::list(&conn, &filter, 2).unwrap();
    assert_eq!(second.items.len(), 5);
    let last = &second.items[4];
    assert_eq!((last.row.client.as_str(), last.row.month), ("Robson", 1));
    assert_eq!(last.metrics.yield_rate, Some(Decimal::new(1, 2)));
}

#[test]
fn text_filters_fold_accented_case() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO clients(id, name, email) VALUES (3, 'ÂNGELA ESTÊVÃO', 'angela@example.com');
        INSERT INTO banks(id, name) VALUES (3, 'Itaú');
        "#,
    )
    .unwrap();
    record(&conn, "2024-03-31", 3, 3, 1, 0, 0, 100);
    record(&conn, "2024-03-31", 1, 1, 1, 0, 0, 200);

    let by_client = filter_from_cli(&["--client", "ângela"]);
    let page = investments::list(&conn, &by_client, 1).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].row.client, "ÂNGELA ESTÊVÃO");

    let by_bank = filter_from_cli(&["--bank", "ITAÚ"]);
    let page = investments::list(&conn, &by_bank, 1).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].row.client, "ÂNGELA ESTÊVÃO");

    let page = clients::list(&conn, Some("estêvão"), 1).unwrap();
    assert_eq!(page.items.len(), 1);
}

#[test]
fn type_filter_matches_name_and_skips_untyped_assets() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO asset_types(id, name) VALUES (1, 'Renda Fixa'), (2, 'Ações');
        INSERT INTO assets(id, name, type_id) VALUES (3, 'PETR4', 2);
        UPDATE assets SET type_id = 1 WHERE id = 1;
        "#,
    )
    .unwrap();
    // CDB is Renda Fixa, LCI has no type
    record(&conn, "2024-03-31", 1, 1, 1, 0, 0, 100);
    record(&conn, "2024-03-31", 1, 1, 2, 0, 0, 200);
    record(&conn, "2024-03-31", 1, 2, 3, 0, 0, 300);

    let fixed = filter_from_cli(&["--type", "fixa"]);
    assert_eq!(
        fixed.predicate(&conn).unwrap().clauses(),
        &[Clause::TypeName("fixa".into())]
    );
    let page = investments::list(&conn, &fixed, 1).unwrap();
    let assets: Vec<_> = page.items.iter().map(|i| i.row.asset.as_str()).collect();
    assert_eq!(assets, vec!["CDB"]);

    let stocks = filter_from_cli(&["--type", "AÇÕES"]);
    let report = reports::totals(&conn, &stocks).unwrap();
    assert_eq!(report.total.gross_balance, 300);
}
