//! Balance Ledger CLI
//!
//! Replays credit/debit commands from a CSV file against a single-account
//! ledger and prints a report to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > history.csv
//! cargo run -- --report balance commands.csv
//! cargo run -- --ledger-file ledger.csv commands.csv
//! cargo run -- --strategy async --batch-size 500 --max-concurrent 8 commands.csv
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `warn`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (input not found, ledger file unavailable or corrupt, output failure)

use balance_ledger::cli::{self, StrategyType};
use balance_ledger::core::{FileLedgerStore, InMemoryLedgerStore, LedgerStore};
use balance_ledger::strategy;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let store: Box<dyn LedgerStore> = match &args.ledger_file {
        Some(path) => match FileLedgerStore::open(path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                eprintln!("Error: cannot open ledger file '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Box::new(InMemoryLedgerStore::new()),
    };

    let config = match args.strategy {
        StrategyType::Async => Some(args.to_batch_config()),
        StrategyType::Sync => None,
    };
    let strategy = strategy::create_strategy(args.strategy, config);

    let mut output = std::io::stdout();
    match strategy.process(&args.input_file, store, args.report, &mut output) {
        Ok(summary) => info!(?summary, "Replay complete"),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
