//! Ledger entry types
//!
//! This module defines the committed ledger entry, its kind (credit or debit),
//! and the request a caller submits to the balance engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commit-order identifier of a ledger entry
///
/// Assigned at commit time, starting at 1, strictly increasing and gap-free.
pub type Sequence = u64;

/// Direction of a monetary movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Adds the amount to the balance
    Credit,

    /// Subtracts the amount from the balance
    ///
    /// Only committed when the amount does not exceed the balance at the
    /// instant of commit.
    Debit,
}

impl EntryKind {
    /// Canonical name, as persisted and reported
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Credit => "Credit",
            EntryKind::Debit => "Debit",
        }
    }

    /// Balance after applying `amount` of this kind to `previous`
    ///
    /// Returns `None` when the result is not representable. Does not enforce
    /// the non-negative balance rule; that is the engine's job.
    pub fn apply(&self, previous: Decimal, amount: Decimal) -> Option<Decimal> {
        match self {
            EntryKind::Credit => previous.checked_add(amount),
            EntryKind::Debit => previous.checked_sub(amount),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    /// Parse a kind name, ignoring case and surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit" => Ok(EntryKind::Credit),
            "debit" => Ok(EntryKind::Debit),
            other => Err(format!("Invalid entry kind: '{}'", other)),
        }
    }
}

/// A committed ledger entry
///
/// Entries are only created by a successful commit through the balance engine
/// and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Commit-order identifier (1-based, gap-free)
    pub sequence: Sequence,

    /// Credit or debit
    pub kind: EntryKind,

    /// Non-negative amount moved by this entry
    pub amount: Decimal,

    /// Account balance immediately after this entry was applied
    pub balance: Decimal,

    /// Wall-clock commit time; informational only, ordering is by `sequence`
    pub timestamp: DateTime<Utc>,
}

/// A proposed movement, before validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmitRequest {
    pub kind: EntryKind,
    pub amount: Decimal,
}

impl SubmitRequest {
    pub fn credit(amount: Decimal) -> Self {
        Self {
            kind: EntryKind::Credit,
            amount,
        }
    }

    pub fn debit(amount: Decimal) -> Self {
        Self {
            kind: EntryKind::Debit,
            amount,
        }
    }
}

/// Check that `entry` may directly follow `previous` in a ledger
///
/// Verifies the sequence is the next one (1 for the first entry), the amount
/// is non-negative, the balance follows from the previous balance and the
/// balance is non-negative.
///
/// # Returns
///
/// * `Ok(())` - If the entry is a valid successor
/// * `Err(String)` - Description of the first violated rule
pub fn check_continuity(previous: Option<&LedgerEntry>, entry: &LedgerEntry) -> Result<(), String> {
    let expected_sequence = previous.map_or(1, |p| p.sequence + 1);
    if entry.sequence != expected_sequence {
        return Err(format!(
            "expected sequence {}, found {}",
            expected_sequence, entry.sequence
        ));
    }

    if entry.amount < Decimal::ZERO {
        return Err(format!(
            "entry {} has negative amount {}",
            entry.sequence, entry.amount
        ));
    }

    let previous_balance = previous.map_or(Decimal::ZERO, |p| p.balance);
    let expected_balance = entry.kind.apply(previous_balance, entry.amount);
    if expected_balance != Some(entry.balance) {
        return Err(format!(
            "entry {} carries balance {}, expected {}",
            entry.sequence,
            entry.balance,
            expected_balance.map_or_else(|| "overflow".to_string(), |b| b.to_string())
        ));
    }

    if entry.balance < Decimal::ZERO {
        return Err(format!(
            "entry {} leaves a negative balance {}",
            entry.sequence, entry.balance
        ));
    }

    Ok(())
}
