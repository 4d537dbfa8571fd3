//! CSV format handling for command input and ledger reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvCommand structure for deserialization of `type,amount` rows
//! - Conversion from CSV commands to submit requests
//! - History and balance report serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{
    parse_amount, EntryKind, LedgerEntry, LedgerError, RejectionReason, SubmitRequest,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: type, amount.
/// The amount is kept as text so that invalid amounts can be reported with
/// the value as written.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvCommand {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Option<String>,
}

/// Why an input row did not become a submit request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    /// Not a command: invalid CSV or an unknown type
    #[error("{0}")]
    Malformed(String),

    /// A credit or debit whose amount the ledger rejects
    #[error("{kind} rejected: {reason}")]
    Rejected {
        kind: EntryKind,
        reason: RejectionReason,
    },
}

impl RowError {
    /// Prefix a malformed-row message with its input line
    pub fn at_line(self, line: usize) -> Self {
        match self {
            RowError::Malformed(message) => {
                RowError::Malformed(format!("Line {}: {}", line, message))
            }
            rejected => rejected,
        }
    }
}

/// Convert a CsvCommand to a SubmitRequest
///
/// # Returns
///
/// * `Ok(SubmitRequest)` - Successfully converted command
/// * `Err(RowError::Malformed)` - Unknown type
/// * `Err(RowError::Rejected)` - Known type with a missing, negative,
///   non-numeric or non-finite amount; always `InvalidAmount`
pub fn convert_csv_command(command: CsvCommand) -> Result<SubmitRequest, RowError> {
    let kind = EntryKind::from_str(&command.kind).map_err(RowError::Malformed)?;

    let raw_amount = command.amount.unwrap_or_default();
    let amount =
        parse_amount(&raw_amount).map_err(|reason| RowError::Rejected { kind, reason })?;

    Ok(SubmitRequest { kind, amount })
}

/// Write ledger entries as CSV
///
/// Columns: sequence, kind, amount, balance, timestamp. Entries are written in
/// the order given; pass `history()` output for most-recent-first reports.
pub fn write_history_csv(entries: &[LedgerEntry], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["sequence", "kind", "amount", "balance", "timestamp"])?;

    for entry in entries {
        writer.write_record(&[
            entry.sequence.to_string(),
            entry.kind.to_string(),
            format!("{:.4}", entry.amount),
            format!("{:.4}", entry.balance),
            entry.timestamp.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the current balance as a one-row CSV
pub fn write_balance_csv(balance: Decimal, output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["balance"])?;
    writer.write_record([format!("{:.4}", balance)])?;

    writer.flush()?;
    Ok(())
}
