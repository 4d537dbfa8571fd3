//! Synchronous replay strategy
//!
//! Streams commands through `SyncReader` into a `BalanceEngine` one at a time,
//! so input order is commit order. Memory use is bounded by the ledger itself,
//! not by the size of the command file.

use crate::cli::ReportKind;
use crate::core::traits::LedgerStore;
use crate::core::BalanceEngine;
use crate::io::csv_format::{write_balance_csv, write_history_csv};
use crate::io::csv_format::RowError;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, ReplaySummary};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Synchronous replay strategy
///
/// ```no_run
/// use balance_ledger::cli::ReportKind;
/// use balance_ledger::core::InMemoryLedgerStore;
/// use balance_ledger::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let mut output = std::io::stdout();
/// SyncProcessingStrategy
///     .process(
///         Path::new("commands.csv"),
///         Box::new(InMemoryLedgerStore::new()),
///         ReportKind::History,
///         &mut output,
///     )
///     .expect("replay failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        input_path: &Path,
        store: Box<dyn LedgerStore>,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, LedgerError> {
        let reader = SyncReader::new(input_path)?;
        let mut engine = BalanceEngine::new(store);
        let mut summary = ReplaySummary::default();

        info!(
            input = %input_path.display(),
            existing_entries = engine.len(),
            "Starting synchronous replay"
        );

        for row in reader {
            match row {
                // Rejections are logged by the engine.
                Ok(request) => summary.record(&engine.submit(request)),
                Err(RowError::Rejected { kind, reason }) => {
                    warn!(kind = %kind, reason = %reason, "Submission rejected");
                    summary.record(&Err(reason));
                }
                Err(e) => {
                    summary.skipped += 1;
                    warn!(error = %e, "Skipping input row");
                }
            }
        }

        match report {
            ReportKind::History => write_history_csv(&engine.history()?, output)?,
            ReportKind::Balance => write_balance_csv(engine.balance(), output)?,
        }

        info!(
            committed = summary.committed,
            rejected = summary.rejected,
            skipped = summary.skipped,
            balance = %engine.balance(),
            "Synchronous replay finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::FlakyStore;
    use crate::core::InMemoryLedgerStore;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn replay(content: &str, report: ReportKind) -> (ReplaySummary, String) {
        let file = create_temp_csv(content);
        let mut output = Vec::new();
        let summary = SyncProcessingStrategy
            .process(
                file.path(),
                Box::new(InMemoryLedgerStore::new()),
                report,
                &mut output,
            )
            .unwrap();
        (summary, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_input_order_is_commit_order() {
        let (summary, output) = replay(
            "type,amount\ncredit,100\ndebit,40\ndebit,1000\ncredit,-5\n",
            ReportKind::History,
        );

        assert_eq!(summary.committed, 2);
        assert_eq!(summary.rejected, 2);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2,Debit,40.0000,60.0000,"));
        assert!(lines[2].starts_with("1,Credit,100.0000,100.0000,"));
    }

    #[test]
    fn test_balance_report_with_skipped_and_rejected_rows() {
        let (summary, output) = replay(
            "type,amount\ncredit,10\nbogus,1\ncredit,abc\ncredit,2.5\n",
            ReportKind::Balance,
        );

        assert_eq!(summary.committed, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(output, "balance\n12.5000\n");
    }

    #[test]
    fn test_storage_failures_are_counted_and_replay_continues() {
        let file = create_temp_csv("type,amount\ncredit,1\ncredit,2\ncredit,3\n");
        let store = FlakyStore::new();
        store.fail_next_appends(1);
        let mut output = Vec::new();

        let summary = SyncProcessingStrategy
            .process(file.path(), Box::new(store), ReportKind::Balance, &mut output)
            .unwrap();

        assert_eq!(summary.committed, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(String::from_utf8(output).unwrap(), "balance\n5.0000\n");
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let mut output = Vec::new();

        let result = SyncProcessingStrategy.process(
            Path::new("missing-commands.csv"),
            Box::new(InMemoryLedgerStore::new()),
            ReportKind::History,
            &mut output,
        );

        assert!(matches!(result, Err(LedgerError::FileNotFound { .. })));
        assert!(output.is_empty());
    }
}
