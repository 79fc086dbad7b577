//! Console-driven Hold'em table.
//!
//! Runs one TableActor against an in-memory ledger and lets players act
//! from stdin, one `<player> <command>` line at a time.

mod commands;
mod config;
mod console;

use std::sync::Arc;

use anyhow::{Error, anyhow};
use ctrlc::set_handler;
use holdem::{
    entities::Username,
    notify::ChannelNotifier,
    table::{TableActor, TableSpeed},
    wallet::{InMemoryLedger, Ledger},
};
use log::{info, warn};
use pico_args::Arguments;
use tokio::sync::watch;

use config::{Overrides, ServerConfig};
use console::Console;

const HELP: &str = "\
Run a single Texas Hold'em table from the console

USAGE:
  holdem_server [OPTIONS]

OPTIONS:
  --name       NAME        Table name                  [default: env TABLE_NAME or Default Table]
  --speed      SPEED       normal, turbo or hyper      [default: env TABLE_SPEED or normal]
  --players    A,B,C       Players given a wallet      [default: env PLAYERS or alice,bob,carol]
  --balance    CHIPS       Starting wallet balance     [default: env STARTING_BALANCE or 10000]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  TABLE_SMALL_BLIND, TABLE_BIG_BLIND, TABLE_MIN_BUY_IN_BB, TABLE_MAX_BUY_IN_BB,
  TABLE_MAX_PLAYERS, TABLE_MIN_PLAYERS, TABLE_ACTION_TIMEOUT_MS,
  TABLE_MIN_RAISE (big-blind or last-raise), TABLE_PAUSE_BETWEEN_HANDS_MS
  RUST_LOG                 Log filter (e.g., info, holdem=debug)
  (A .env file in the working directory is loaded first)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        name: pargs.opt_value_from_str("--name")?,
        speed: pargs.opt_value_from_fn("--speed", str::parse::<TableSpeed>)?,
        players: pargs.opt_value_from_fn("--players", |v| {
            Ok::<_, String>(config::split_players(v))
        })?,
        starting_balance: pargs.opt_value_from_str("--balance")?,
    };
    let unused = pargs.finish();

    env_logger::builder().format_target(false).init();
    if !unused.is_empty() {
        warn!("ignoring unknown arguments: {unused:?}");
    }

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    let ledger = Arc::new(InMemoryLedger::with_balances(
        config
            .players
            .iter()
            .map(|name| (name.as_str(), config.starting_balance)),
    ));
    let (notifier, facts) = ChannelNotifier::new();
    let (actor, handle) = TableActor::new(config.table.clone(), ledger.clone(), Arc::new(notifier));
    info!(
        "Starting table {} (blinds {}, {} speed)",
        config.table.name,
        config.table.blinds(),
        config.table.speed
    );
    let table = tokio::spawn(actor.run());

    let events = handle
        .subscribe("console", 256)
        .await
        .ok_or_else(|| anyhow!("table closed before the console attached"))?;

    // Catching signals for a graceful close: the table refunds and cashes
    // everybody out before exiting.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    set_handler(move || {
        let _ = shutdown_tx.send(true);
    })?;

    Console::new(handle, facts, events, shutdown_rx).run().await?;
    table.await?;

    for name in &config.players {
        let balance = ledger.get_balance(&Username::new(name)).await?;
        info!("{name}: final balance {balance}");
    }

    Ok(())
}
