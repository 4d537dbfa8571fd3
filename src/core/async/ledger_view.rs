//! Thread-safe read snapshot of a ledger
//!
//! This module provides the `LedgerView` struct, which holds a copy of the
//! committed entries for concurrent readers.
//!
//! # Design
//!
//! The view is guarded by a `parking_lot::RwLock`. The shared engine publishes
//! each entry while it still holds the writer lock, so the view only ever moves
//! from one committed state to the next. Readers take the read lock, which
//! means:
//! - Any number of `history` / `balance` calls run in parallel
//! - A reader sees the ledger entirely before or entirely after a commit
//! - Readers never wait on the store's I/O, only on the in-memory push

use crate::types::LedgerEntry;
use parking_lot::RwLock;
use rust_decimal::Decimal;

/// Read snapshot of committed entries
#[derive(Debug, Default)]
pub struct LedgerView {
    /// Committed entries in sequence order
    entries: RwLock<Vec<LedgerEntry>>,
}

impl LedgerView {
    /// Create an empty view
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a view seeded with existing entries (oldest first)
    pub fn from_entries(entries: Vec<LedgerEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Make a newly committed entry visible to readers
    pub(crate) fn publish(&self, entry: LedgerEntry) {
        self.entries.write().push(entry);
    }

    /// Committed entries, most recent first
    pub fn history(&self) -> Vec<LedgerEntry> {
        self.entries.read().iter().rev().cloned().collect()
    }

    /// Balance of the last committed entry; zero when empty
    pub fn balance(&self) -> Decimal {
        self.entries
            .read()
            .last()
            .map_or(Decimal::ZERO, |entry| entry.balance)
    }

    /// Number of committed entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
