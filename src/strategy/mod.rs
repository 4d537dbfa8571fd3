//! Replay strategy module
//!
//! This module defines the Strategy pattern for complete replay pipelines:
//! reading a command CSV, submitting every command to a balance engine over a
//! given ledger store, and writing a report. Implementations (synchronous,
//! concurrent batch) are selected at runtime.

use crate::cli::{ReportKind, StrategyType};
use crate::core::traits::LedgerStore;
use crate::types::{LedgerEntry, LedgerError, RejectionReason};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Counts of what happened to each input row during a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Commands appended to the ledger
    pub committed: usize,

    /// Commands definitely rejected (invalid amount, insufficient balance, storage failure)
    pub rejected: usize,

    /// Rows that are not valid CSV or name an unknown command type
    pub skipped: usize,

    /// Commands whose outcome was not known when the caller stopped waiting
    pub unknown: usize,
}

impl ReplaySummary {
    /// Count one submission outcome
    pub fn record(&mut self, result: &Result<LedgerEntry, RejectionReason>) {
        match result {
            Ok(_) => self.committed += 1,
            Err(reason) if reason.is_definite() => self.rejected += 1,
            Err(_) => self.unknown += 1,
        }
    }
}

/// Replay pipeline trait
///
/// Each strategy reads commands from a CSV file, submits them to a balance
/// engine that takes ownership of `store`, and writes the chosen report.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay `input_path` against `store` and write the report to `output`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened
    /// - The store cannot be read when the engine starts
    /// - The report cannot be written
    ///
    /// Malformed rows and rejected commands are logged and counted in the
    /// summary; they never abort the replay.
    fn process(
        &self,
        input_path: &Path,
        store: Box<dyn LedgerStore>,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, LedgerError>;
}

/// Create a replay strategy based on the specified strategy type
///
/// `config` is only used by the async strategy; `None` means defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(config.unwrap_or_default())),
    }
}
