//! Balance engine
//!
//! This module provides the BalanceEngine, the single authority that decides
//! whether a proposed entry may be committed and what balance it carries.
//!
//! The engine enforces the ledger rules:
//! - Amounts must be non-negative (validated before anything else)
//! - A debit is only committed if it does not exceed the balance at commit time
//! - Each committed entry carries `previous balance ± amount` and the next sequence
//! - Exactly one append per successful submission, none on rejection
//!
//! The read-validate-append step is [`commit`]. `BalanceEngine` takes `&mut self`
//! for every write, so the borrow checker makes each submission a critical
//! section. [`SharedBalanceEngine`](crate::core::r#async::SharedBalanceEngine)
//! runs the same step under an async mutex for concurrent callers.

use crate::core::ledger_store::InMemoryLedgerStore;
use crate::core::traits::LedgerStore;
use crate::types::{
    validate_amount, EntryKind, LedgerEntry, RejectionReason, StoreError, SubmitRequest,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, warn};

/// Validate a request against the store's current state and append it
///
/// The caller must hold exclusive access to `store` for the whole call.
///
/// # Errors
///
/// * `RejectionReason::InvalidAmount` - Negative amount, or a credit that would overflow
/// * `RejectionReason::InsufficientBalance` - Debit larger than the current balance
/// * `RejectionReason::StorageFailure` - The store refused or failed the append
pub(crate) fn commit<S: LedgerStore + ?Sized>(
    store: &mut S,
    request: SubmitRequest,
    timestamp: DateTime<Utc>,
) -> Result<LedgerEntry, RejectionReason> {
    let SubmitRequest { kind, amount } = request;
    validate_amount(amount)?;

    let previous = store.current_balance();
    if kind == EntryKind::Debit && amount > previous {
        return Err(RejectionReason::insufficient_balance(previous, amount));
    }
    let balance = kind
        .apply(previous, amount)
        .ok_or_else(|| RejectionReason::invalid_amount(amount.to_string()))?;

    let entry = LedgerEntry {
        sequence: store.next_sequence(),
        kind,
        amount,
        balance,
        timestamp,
    };

    let committed = store.append(entry).map_err(|e| {
        error!(kind = %kind, amount = %amount, error = %e, "Ledger append failed");
        RejectionReason::storage_failure(e)
    })?;

    debug!(
        sequence = committed.sequence,
        kind = %committed.kind,
        amount = %committed.amount,
        balance = %committed.balance,
        "Committed ledger entry"
    );
    Ok(committed)
}

/// Synchronous balance engine
///
/// Owns its ledger store exclusively; no other component appends to it.
pub struct BalanceEngine<S: LedgerStore = InMemoryLedgerStore> {
    store: S,
}

impl BalanceEngine<InMemoryLedgerStore> {
    /// Create an engine over an empty in-memory ledger
    pub fn in_memory() -> Self {
        Self::new(InMemoryLedgerStore::new())
    }
}

impl<S: LedgerStore> BalanceEngine<S> {
    /// Create an engine that takes ownership of `store`
    ///
    /// The store may already contain entries; the engine continues from its
    /// last balance and sequence.
    pub fn new(store: S) -> Self {
        BalanceEngine { store }
    }

    /// Submit a proposed entry
    ///
    /// On success the entry has been durably appended and is returned with its
    /// computed balance and assigned sequence. On rejection the ledger is
    /// unchanged.
    pub fn submit(&mut self, request: SubmitRequest) -> Result<LedgerEntry, RejectionReason> {
        let result = commit(&mut self.store, request, Utc::now());
        if let Err(reason) = &result {
            warn!(
                kind = %request.kind,
                amount = %request.amount,
                reason = %reason,
                "Submission rejected"
            );
        }
        result
    }

    /// Submit a credit of `amount`
    pub fn credit(&mut self, amount: Decimal) -> Result<LedgerEntry, RejectionReason> {
        self.submit(SubmitRequest::credit(amount))
    }

    /// Submit a debit of `amount`
    pub fn debit(&mut self, amount: Decimal) -> Result<LedgerEntry, RejectionReason> {
        self.submit(SubmitRequest::debit(amount))
    }

    /// Committed entries, most recent first
    pub fn history(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        let mut entries = self.store.read_all()?;
        entries.reverse();
        Ok(entries)
    }

    /// Current balance; zero for an empty ledger
    pub fn balance(&self) -> Decimal {
        self.store.current_balance()
    }

    /// Number of committed entries
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Read-only access to the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store back, e.g. to hand it to a shared engine
    pub fn into_store(self) -> S {
        self.store
    }
}

impl Default for BalanceEngine<InMemoryLedgerStore> {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::FlakyStore;
    use rstest::rstest;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn test_empty_ledger_has_zero_balance() {
        let engine = BalanceEngine::in_memory();

        assert_eq!(engine.balance(), Decimal::ZERO);
        assert!(engine.history().unwrap().is_empty());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_first_credit() {
        let mut engine = BalanceEngine::in_memory();

        let entry = engine.credit(dec(100)).unwrap();

        assert_eq!(entry.sequence, 1);
        assert_eq!(entry.kind, EntryKind::Credit);
        assert_eq!(entry.amount, dec(100));
        assert_eq!(entry.balance, dec(100));
        assert_eq!(engine.balance(), dec(100));

        let history = engine.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], entry);
    }

    #[test]
    fn test_debit_after_credit() {
        let mut engine = BalanceEngine::in_memory();
        engine.credit(dec(100)).unwrap();

        let entry = engine.debit(dec(40)).unwrap();

        assert_eq!(entry.sequence, 2);
        assert_eq!(entry.balance, dec(60));
        assert_eq!(engine.balance(), dec(60));
    }

    #[test]
    fn test_overdraft_rejected_and_ledger_unchanged() {
        let mut engine = BalanceEngine::in_memory();
        engine.credit(dec(100)).unwrap();
        engine.debit(dec(40)).unwrap();

        let result = engine.debit(dec(1000));

        assert_eq!(
            result,
            Err(RejectionReason::insufficient_balance(dec(60), dec(1000)))
        );
        assert_eq!(engine.balance(), dec(60));
        assert_eq!(engine.history().unwrap().len(), 2);
    }

    #[test]
    fn test_negative_credit_rejected() {
        let mut engine = BalanceEngine::in_memory();

        let result = engine.credit(dec(-5));

        assert!(matches!(result, Err(RejectionReason::InvalidAmount { .. })));
        assert!(engine.is_empty());
        assert_eq!(engine.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_invalid_amount_checked_before_balance() {
        let mut engine = BalanceEngine::in_memory();

        // Negative debit on an empty ledger is an amount problem, not a balance one
        let result = engine.debit(dec(-1));
        assert!(matches!(result, Err(RejectionReason::InvalidAmount { .. })));
    }

    #[test]
    fn test_debit_of_entire_balance() {
        let mut engine = BalanceEngine::in_memory();
        engine.credit(Decimal::new(10050, 2)).unwrap();

        let entry = engine.debit(Decimal::new(10050, 2)).unwrap();
        assert_eq!(entry.balance, Decimal::ZERO);
    }

    #[rstest]
    #[case::credit(EntryKind::Credit)]
    #[case::debit(EntryKind::Debit)]
    fn test_zero_amount_is_accepted(#[case] kind: EntryKind) {
        let mut engine = BalanceEngine::in_memory();

        let entry = engine
            .submit(SubmitRequest {
                kind,
                amount: Decimal::ZERO,
            })
            .unwrap();

        assert_eq!(entry.balance, Decimal::ZERO);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_credit_overflow_is_invalid_amount() {
        let mut engine = BalanceEngine::in_memory();
        engine.credit(Decimal::MAX).unwrap();

        let result = engine.credit(Decimal::ONE);

        assert!(matches!(result, Err(RejectionReason::InvalidAmount { .. })));
        assert_eq!(engine.balance(), Decimal::MAX);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_history_is_most_recent_first() {
        let mut engine = BalanceEngine::in_memory();
        engine.credit(dec(10)).unwrap();
        engine.credit(dec(20)).unwrap();
        engine.debit(dec(5)).unwrap();

        let sequences: Vec<_> = engine
            .history()
            .unwrap()
            .iter()
            .map(|e| e.sequence)
            .collect();
        assert_eq!(sequences, vec![3, 2, 1]);
    }

    #[test]
    fn test_storage_failure_does_not_advance_sequence() {
        let mut engine = BalanceEngine::new(FlakyStore::new());
        engine.credit(dec(50)).unwrap();

        engine.store().fail_next_appends(1);
        let result = engine.credit(dec(10));
        assert!(matches!(
            result,
            Err(RejectionReason::StorageFailure {
                source: StoreError::Unavailable { .. }
            })
        ));
        assert_eq!(engine.balance(), dec(50));
        assert_eq!(engine.len(), 1);

        // Retrying is safe and lands on the next unused sequence
        let retried = engine.credit(dec(10)).unwrap();
        assert_eq!(retried.sequence, 2);
        assert_eq!(retried.balance, dec(60));
    }

    #[test]
    fn test_rejected_debit_consumes_no_sequence() {
        let mut engine = BalanceEngine::in_memory();
        engine.credit(dec(5)).unwrap();
        engine.debit(dec(6)).unwrap_err();

        let entry = engine.credit(dec(1)).unwrap();
        assert_eq!(entry.sequence, 2);
    }

    #[test]
    fn test_engine_continues_existing_store() {
        let mut engine = BalanceEngine::in_memory();
        engine.credit(dec(30)).unwrap();
        let store = engine.into_store();

        let mut resumed = BalanceEngine::new(store);
        let entry = resumed.debit(dec(10)).unwrap();
        assert_eq!(entry.sequence, 2);
        assert_eq!(entry.balance, dec(20));
    }
}
