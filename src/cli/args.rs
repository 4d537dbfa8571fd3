use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay credit/debit commands against a single-account ledger
#[derive(Parser, Debug)]
#[command(name = "balance-ledger")]
#[command(about = "Replay credit/debit commands against a single-account ledger", long_about = None)]
pub struct CliArgs {
    /// Input CSV file with `type,amount` rows
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Replay strategy: 'sync' commits in input order, 'async' submits batches concurrently"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "history",
        help = "Report written to stdout: full history (most recent first) or final balance"
    )]
    pub report: ReportKind,

    /// Durable ledger file; the in-memory store is used when absent
    #[arg(
        long = "ledger-file",
        value_name = "PATH",
        env = "LEDGER_FILE",
        help = "Append-only ledger file to continue from and write to"
    )]
    pub ledger_file: Option<PathBuf>,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (async mode only, default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (async mode only, default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    #[arg(
        long = "commit-timeout-ms",
        value_name = "MILLIS",
        env = "LEDGER_COMMIT_TIMEOUT_MS",
        help = "How long an async submission waits for its commit (default: 5000)"
    )]
    pub commit_timeout_ms: Option<u64>,
}

/// Available replay strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Report written after a replay
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    History,
    Balance,
}

impl CliArgs {
    /// Build a BatchConfig from the arguments, falling back to defaults
    pub fn to_batch_config(&self) -> BatchConfig {
        let default = BatchConfig::default();

        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_concurrent_batches
                .unwrap_or(default.max_concurrent_batches),
            self.commit_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default.commit_timeout),
        )
    }
}
