//! Ledger store abstraction
//!
//! The balance engines are generic over [`LedgerStore`] so the in-memory and
//! file-backed stores can be used interchangeably, and so callers can pick one
//! at runtime through `Box<dyn LedgerStore>`.

use crate::types::{LedgerEntry, Sequence, StoreError};
use rust_decimal::Decimal;

/// Append-only, ordered storage of committed ledger entries
///
/// A store performs no validation beyond sequence continuity; deciding what
/// may be appended is the balance engine's job. Only the engine that owns a
/// store appends to it.
pub trait LedgerStore: Send {
    /// Persist an entry and return it as committed
    ///
    /// On error nothing was persisted and the store's state is unchanged.
    fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError>;

    /// All entries, oldest first
    ///
    /// Always returns the full current contents; may be called repeatedly.
    fn read_all(&self) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Balance of the last entry, or zero for an empty store
    fn current_balance(&self) -> Decimal;

    /// Sequence of the last entry, if any
    fn last_sequence(&self) -> Option<Sequence>;

    /// Number of committed entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sequence the next committed entry must carry
    fn next_sequence(&self) -> Sequence {
        self.last_sequence().map_or(1, |last| last + 1)
    }

    /// Reject an entry that does not carry the next sequence
    fn check_sequence(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        let expected = self.next_sequence();
        if entry.sequence != expected {
            return Err(StoreError::sequence_gap(expected, entry.sequence));
        }
        Ok(())
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        (**self).append(entry)
    }

    fn read_all(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        (**self).read_all()
    }

    fn current_balance(&self) -> Decimal {
        (**self).current_balance()
    }

    fn last_sequence(&self) -> Option<Sequence> {
        (**self).last_sequence()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
