//! Ledger stores with injectable failures, for tests

use crate::core::ledger_store::InMemoryLedgerStore;
use crate::core::traits::LedgerStore;
use crate::types::{LedgerEntry, Sequence, StoreError};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory store whose next N appends fail with `Unavailable`
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: InMemoryLedgerStore,
    failures: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_appends(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Handle that can arm failures after the store has moved into an engine
    pub fn failure_switch(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.failures)
    }
}

impl LedgerStore for FlakyStore {
    fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        let armed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            return Err(StoreError::unavailable("injected failure"));
        }
        self.inner.append(entry)
    }

    fn read_all(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        self.inner.read_all()
    }

    fn current_balance(&self) -> Decimal {
        self.inner.current_balance()
    }

    fn last_sequence(&self) -> Option<Sequence> {
        self.inner.last_sequence()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// In-memory store that blocks for a fixed delay inside every append
#[derive(Debug)]
pub struct SlowStore {
    inner: InMemoryLedgerStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryLedgerStore::new(),
            delay,
        }
    }
}

impl LedgerStore for SlowStore {
    fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        std::thread::sleep(self.delay);
        self.inner.append(entry)
    }

    fn read_all(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        self.inner.read_all()
    }

    fn current_balance(&self) -> Decimal {
        self.inner.current_balance()
    }

    fn last_sequence(&self) -> Option<Sequence> {
        self.inner.last_sequence()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
