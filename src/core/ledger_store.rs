//! In-memory ledger store
//!
//! A `Vec`-backed [`LedgerStore`]. Entries live as long as the store; nothing
//! survives the process. Used by default for replay runs and in tests.

use crate::core::traits::LedgerStore;
use crate::types::{LedgerEntry, Sequence, StoreError};
use rust_decimal::Decimal;

/// Volatile ledger store
///
/// Appends cannot fail except for a sequence gap.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedgerStore {
    /// Committed entries in sequence order
    entries: Vec<LedgerEntry>,
}

impl InMemoryLedgerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        self.check_sequence(&entry)?;
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn read_all(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self.entries.clone())
    }

    fn current_balance(&self) -> Decimal {
        self.entries
            .last()
            .map_or(Decimal::ZERO, |entry| entry.balance)
    }

    fn last_sequence(&self) -> Option<Sequence> {
        self.entries.last().map(|entry| entry.sequence)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
