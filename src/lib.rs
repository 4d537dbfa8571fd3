//! Balance Ledger Library
//! # Overview
//!
//! An append-only, single-account ledger of credits and debits. Every
//! committed entry carries the balance immediately after it and a gap-free
//! sequence number, and the balance never goes negative, including under
//! concurrent writers.
//!
//! # Architecture
//!
//! - [`types`] - Entries, amounts and error types
//! - [`core`] - Ledger stores and balance engines:
//!   - [`core::traits`] - The `LedgerStore` abstraction
//!   - [`core::ledger_store`] / [`core::file_store`] - In-memory and durable stores
//!   - [`core::engine`] - Synchronous `BalanceEngine`
//!   - [`core::r#async`] - `SharedBalanceEngine` for concurrent callers
//! - [`api`] - Request/response contract for a transport layer
//! - [`io`] - Command CSV reading and report writing
//! - [`strategy`] - Sync and concurrent replay pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Invariants
//!
//! - The empty ledger has balance 0
//! - Each entry's balance is the previous balance plus (credit) or minus (debit) its amount
//! - A debit larger than the balance at commit time is rejected and never appended
//! - Entries are never updated or deleted
//! - Sequences start at 1 and increase by exactly 1 per commit

pub mod api;
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use api::{ApiResponse, LedgerApi, StatusClass};
pub use core::{
    BalanceEngine, FileLedgerStore, InMemoryLedgerStore, LedgerStore, SharedBalanceEngine,
};
pub use io::{write_balance_csv, write_history_csv};
pub use types::{
    EntryKind, LedgerEntry, LedgerError, RejectionReason, Sequence, StoreError, SubmitRequest,
};
