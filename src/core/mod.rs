//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - The `LedgerStore` abstraction shared by all stores
//! - `ledger_store` - Volatile in-memory store
//! - `file_store` - Durable CSV append-log store
//! - `engine` - Synchronous balance engine (single owner, `&mut self` writes)
//! - `async` - Shared balance engine and concurrent submission for tokio callers

pub mod r#async;
pub mod engine;
pub mod file_store;
pub mod ledger_store;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::BalanceEngine;
pub use file_store::FileLedgerStore;
pub use ledger_store::InMemoryLedgerStore;
pub use r#async::{LedgerView, SharedBalanceEngine, SubmissionProcessor, SubmissionResult};
pub use traits::LedgerStore;
