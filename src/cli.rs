// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn text(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(long).help(help).num_args(1)
}

fn required(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    text(id, long, help).required(true)
}

fn money(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    text(id, long, help).allow_hyphen_values(true)
}

fn id_required() -> Arg {
    required("id", "id", "Row id")
}

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn list_cmd() -> Command {
    json_args(
        Command::new("list")
            .about("List rows")
            .arg(text("query", "query", "Case-insensitive search"))
            .arg(
                Arg::new("page")
                    .long("page")
                    .value_parser(value_parser!(u32))
                    .help("Page number (1-based)"),
            ),
    )
}

fn filter_args(cmd: Command) -> Command {
    cmd.arg(text("client", "client", "Client name contains"))
        .arg(text("year", "year", "Exact year, e.g. 2024"))
        .arg(text("month", "month", "Exact month, 1-12 or 01-12"))
        .arg(text("bank", "bank", "Bank name contains"))
        .arg(text("asset", "asset", "Asset name contains"))
        .arg(text("type", "type", "Asset type name contains"))
        .arg(text("category", "category", "Category id (includes sub-categories)"))
}

fn named_cmd(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .subcommand_required(true)
        .subcommand(Command::new("add").arg(required("name", "name", "Name")))
        .subcommand(
            Command::new("edit")
                .arg(id_required())
                .arg(required("name", "name", "New name")),
        )
        .subcommand(Command::new("rm").arg(id_required()))
        .subcommand(list_cmd())
}

fn investment_fields(cmd: Command, create: bool) -> Command {
    let field = |id, long, help| {
        if create {
            required(id, long, help)
        } else {
            text(id, long, help)
        }
    };
    cmd.arg(field("date", "date", "Snapshot date YYYY-MM-DD"))
        .arg(field("client_id", "client", "Client id"))
        .arg(field("bank_id", "bank", "Bank id"))
        .arg(field("asset_id", "asset", "Asset id"))
        .arg(money(
            "previous_balance",
            "previous-balance",
            "Previous balance (blank: carried from the last snapshot)",
        ))
        .arg(money("monthly_yield", "monthly-yield", "Yield for the month"))
        .arg(money("dividends", "dividends", "Dividends received"))
        .arg(money("applied", "applied", "Amount applied"))
        .arg(money("redeemed", "redeemed", "Amount redeemed"))
        .arg(money("incurred_tax", "incurred-tax", "Tax incurred"))
        .arg(money("projected_tax", "projected-tax", "Tax projected"))
        .arg(money("gross_balance", "gross-balance", "Gross balance"))
        .arg(money("net_balance", "net-balance", "Net balance"))
}

pub fn build_cli() -> Command {
    Command::new("investboard")
        .about("Family investment tracking and reports")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_parser(value_parser!(std::path::PathBuf))
                .help("SQLite database path (default: $INVESTBOARD_DB or the platform data dir)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging (RUST_LOG overrides)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("client")
                .about("Manage clients")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(required("name", "name", "Client name"))
                        .arg(required("email", "email", "Client email")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(id_required())
                        .arg(text("name", "name", "Client name"))
                        .arg(text("email", "email", "Client email")),
                )
                .subcommand(Command::new("rm").arg(id_required()).about(
                    "Remove a client together with its invoices and investments",
                ))
                .subcommand(list_cmd()),
        )
        .subcommand(named_cmd("bank", "Manage banks"))
        .subcommand(named_cmd("type", "Manage asset types"))
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(required("name", "name", "Category name"))
                        .arg(text("parent_id", "parent", "Parent category id")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(id_required())
                        .arg(text("name", "name", "Category name"))
                        .arg(text("parent_id", "parent", "Parent category id (empty to clear)")),
                )
                .subcommand(Command::new("rm").arg(id_required()))
                .subcommand(list_cmd()),
        )
        .subcommand(
            Command::new("asset")
                .about("Manage assets")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(required("name", "name", "Asset name"))
                        .arg(text("type_id", "type", "Asset type id"))
                        .arg(text("categories", "categories", "Comma-separated category ids")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(id_required())
                        .arg(text("name", "name", "Asset name"))
                        .arg(text("type_id", "type", "Asset type id (empty to clear)"))
                        .arg(text("categories", "categories", "Comma-separated category ids")),
                )
                .subcommand(Command::new("rm").arg(id_required()))
                .subcommand(list_cmd()),
        )
        .subcommand(
            Command::new("investment")
                .visible_alias("inv")
                .about("Manage monthly investment records")
                .subcommand_required(true)
                .subcommand(investment_fields(Command::new("add"), true))
                .subcommand(investment_fields(
                    Command::new("edit").arg(id_required()),
                    false,
                ))
                .subcommand(Command::new("rm").arg(id_required()))
                .subcommand(json_args(filter_args(
                    Command::new("list").arg(
                        Arg::new("page")
                            .long("page")
                            .value_parser(value_parser!(u32))
                            .help("Page number (1-based)"),
                    ),
                ))),
        )
        .subcommand(
            Command::new("invoice")
                .about("Manage invoices")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(required("client_id", "client", "Client id"))
                        .arg(required("amount", "amount", "Amount"))
                        .arg(text("status", "status", "pending | paid").default_value("pending"))
                        .arg(text("date", "date", "Date YYYY-MM-DD (default: today)")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(id_required())
                        .arg(text("client_id", "client", "Client id"))
                        .arg(text("amount", "amount", "Amount"))
                        .arg(text("status", "status", "pending | paid"))
                        .arg(text("date", "date", "Date YYYY-MM-DD")),
                )
                .subcommand(Command::new("rm").arg(id_required()))
                .subcommand(list_cmd()),
        )
        .subcommand(
            Command::new("report")
                .about("Investment reports")
                .subcommand_required(true)
                .subcommand(json_args(filter_args(
                    Command::new("totals").about("Totals per client and period"),
                )))
                .subcommand(json_args(filter_args(
                    Command::new("diversification")
                        .about("Gross balance distribution")
                        .arg(
                            text("by", "by", "category | bank")
                                .value_parser(["category", "bank"])
                                .default_value("category"),
                        )
                        .arg(
                            text("snapshot", "snapshot", "auto | latest | all")
                                .value_parser(["auto", "latest", "all"])
                                .default_value("auto"),
                        ),
                )))
                .subcommand(json_args(filter_args(
                    Command::new("performance").about("Totals per period over time"),
                )))
                .subcommand(json_args(
                    Command::new("summary").about("Dashboard summary cards"),
                )),
        )
        .subcommand(
            Command::new("config")
                .about("Display settings")
                .subcommand_required(true)
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(required("key", "key", "locale | currency_symbol | percent_decimals"))
                        .arg(required("value", "value", "New value")),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand_required(true)
                .subcommand(filter_args(
                    Command::new("investments")
                        .arg(
                            required("format", "format", "csv | json")
                                .value_parser(["csv", "json"]),
                        )
                        .arg(required("out", "out", "Output file")),
                )),
        )
        .subcommand(Command::new("doctor").about("Check data consistency"))
}
