//! Concurrent batch replay strategy
//!
//! Reads commands in batches and submits each batch concurrently through a
//! `SubmissionProcessor` on a multi-threaded tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches, commit_timeout)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── SubmissionProcessor (one task per command)
//!     └── SharedBalanceEngine (single writer, snapshot reads)
//! ```
//!
//! # Ordering
//!
//! Batches run one after another, so a command never races a command from a
//! later batch. Within a batch, commands race for the engine's writer and the
//! ledger records them in some serial order. A batch size of 1 reproduces
//! input order exactly.

use crate::cli::ReportKind;
use crate::core::r#async::{SharedBalanceEngine, SubmissionProcessor, DEFAULT_COMMIT_TIMEOUT};
use crate::core::traits::LedgerStore;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::{write_balance_csv, write_history_csv};
use crate::strategy::{ProcessingStrategy, ReplaySummary};
use crate::types::LedgerError;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{info, warn};

/// Configuration for batch replay
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
    /// How long a submission waits for its commit before reporting an unknown outcome
    pub commit_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize, commit_timeout: Duration) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(default = default.batch_size, "Invalid batch_size 0, using default");
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                default = default.max_concurrent_batches,
                "Invalid max_concurrent_batches 0, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        let commit_timeout = if commit_timeout.is_zero() {
            warn!(
                default_ms = default.commit_timeout.as_millis() as u64,
                "Invalid commit_timeout 0, using default"
            );
            default.commit_timeout
        } else {
            commit_timeout
        };

        Self {
            batch_size,
            max_concurrent_batches,
            commit_timeout,
        }
    }
}

/// Concurrent batch replay strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(
        &self,
        input_path: &Path,
        store: Box<dyn LedgerStore>,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .enable_all()
            .build()
            .map_err(|e| LedgerError::runtime(format!("Failed to create tokio runtime: {}", e)))?;

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound => LedgerError::file_not_found(input_path.display().to_string()),
                    _ => LedgerError::from(e),
                })?;

            let engine = Arc::new(SharedBalanceEngine::new(store, self.config.commit_timeout)?);
            let processor = SubmissionProcessor::new(Arc::clone(&engine));
            let mut reader = AsyncReader::new(file.compat());
            let mut summary = ReplaySummary::default();

            info!(
                input = %input_path.display(),
                existing_entries = engine.len(),
                batch_size = self.config.batch_size,
                workers = self.config.max_concurrent_batches,
                "Starting concurrent replay"
            );

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for submitted in processor.process_batch(batch).await {
                    summary.record(&submitted.result);
                }
            }
            summary.skipped = reader.skipped();
            summary.rejected += reader.rejected();

            // Commits whose callers timed out may still be running.
            engine.settle().await;

            match report {
                ReportKind::History => write_history_csv(&engine.history(), output)?,
                ReportKind::Balance => write_balance_csv(engine.balance(), output)?,
            }

            info!(
                committed = summary.committed,
                rejected = summary.rejected,
                skipped = summary.skipped,
                unknown = summary.unknown,
                balance = %engine.balance(),
                "Concurrent replay finished"
            );
            Ok(summary)
        })
    }
}
