//! Error types for the balance ledger
//!
//! Three layers of failure are distinguished:
//!
//! - [`StoreError`] - the ledger store could not read or write its medium
//! - [`RejectionReason`] - why a submission was not committed (or may not have been)
//! - [`LedgerError`] - fatal errors that abort a replay run (missing input, bad output)
//!
//! Rejections are terminal at the engine boundary: the engine never retries.

use super::entry::Sequence;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failure of the durable ledger medium
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The medium could not be written or read
    ///
    /// The append did not happen; nothing was persisted.
    #[error("Ledger store unavailable: {message}")]
    Unavailable {
        /// Description of the underlying failure
        message: String,
    },

    /// An append would break the gap-free sequence
    #[error("Sequence gap: expected {expected}, got {actual}")]
    SequenceGap {
        expected: Sequence,
        actual: Sequence,
    },

    /// Persisted contents violate the ledger invariants
    #[error("Ledger store corrupt{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Corrupt {
        /// Line of the persisted log where the problem was found (if known)
        line: Option<u64>,
        message: String,
    },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    pub fn sequence_gap(expected: Sequence, actual: Sequence) -> Self {
        StoreError::SequenceGap { expected, actual }
    }

    pub fn corrupt(line: Option<u64>, message: impl Into<String>) -> Self {
        StoreError::Corrupt {
            line,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::unavailable(error.to_string())
    }
}

/// Why a submission was not committed
///
/// Every variant except [`RejectionReason::OutcomeUnknown`] is definite: the
/// ledger is unchanged and no sequence was consumed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectionReason {
    /// Amount is negative, non-finite, malformed or cannot be applied
    #[error("Invalid amount '{amount}'")]
    InvalidAmount {
        /// The offending amount as received
        amount: String,
    },

    /// Debit exceeds the balance at the instant of commit
    #[error("Insufficient balance: balance {balance}, requested {requested}")]
    InsufficientBalance {
        balance: Decimal,
        requested: Decimal,
    },

    /// The store failed the append; the entry was not committed
    ///
    /// Safe to retry.
    #[error("Storage failure: {source}")]
    StorageFailure {
        #[source]
        source: StoreError,
    },

    /// The caller stopped waiting before the commit finished
    ///
    /// The entry may or may not have been committed. Inspect history before
    /// retrying.
    #[error("Commit outcome unknown after {timeout_ms}ms")]
    OutcomeUnknown { timeout_ms: u64 },
}

impl RejectionReason {
    pub fn invalid_amount(amount: impl Into<String>) -> Self {
        RejectionReason::InvalidAmount {
            amount: amount.into(),
        }
    }

    pub fn insufficient_balance(balance: Decimal, requested: Decimal) -> Self {
        RejectionReason::InsufficientBalance { balance, requested }
    }

    pub fn storage_failure(source: StoreError) -> Self {
        RejectionReason::StorageFailure { source }
    }

    pub fn outcome_unknown(timeout_ms: u64) -> Self {
        RejectionReason::OutcomeUnknown { timeout_ms }
    }

    /// Whether the ledger is known to be unchanged by this submission
    pub fn is_definite(&self) -> bool {
        !matches!(self, RejectionReason::OutcomeUnknown { .. })
    }

    /// Whether resubmitting the same request cannot double-apply it
    pub fn is_retryable(&self) -> bool {
        matches!(self, RejectionReason::StorageFailure { .. })
    }
}

impl From<StoreError> for RejectionReason {
    fn from(error: StoreError) -> Self {
        RejectionReason::storage_failure(error)
    }
}

/// Fatal error that aborts a replay run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Input file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error while reading input or writing the report
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// CSV error that prevents reading or writing at all
    #[error("CSV error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        line: Option<u64>,
        message: String,
    },

    /// Ledger store could not be opened or read
    #[error("Ledger store error: {0}")]
    Store(#[from] StoreError),

    /// Async runtime could not be created
    #[error("Runtime error: {message}")]
    RuntimeError { message: String },
}

impl LedgerError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        LedgerError::FileNotFound { path: path.into() }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        LedgerError::RuntimeError {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}
