//! Concurrent implementations of the core components
//!
//! This module provides the thread-safe counterparts of the synchronous
//! balance engine for callers running on a tokio runtime.
//!
//! # Architecture
//!
//! - **SharedBalanceEngine**: Cloneable engine; one writer at a time, commits
//!   bounded by a timeout that reports unknown outcomes explicitly
//! - **LedgerView**: `RwLock`-guarded read snapshot so readers never block each other
//! - **SubmissionProcessor**: Fans batches of requests out to concurrent tasks
//!
//! # Thread Safety
//!
//! The ledger of one account is a single sequence, so writes cannot be
//! partitioned the way independent accounts could be. All writes go through
//! one async mutex; reads bypass it entirely.

pub mod engine;
pub mod ledger_view;
pub mod submission_processor;

pub use engine::{SharedBalanceEngine, DEFAULT_COMMIT_TIMEOUT};
pub use ledger_view::LedgerView;
pub use submission_processor::{SubmissionProcessor, SubmissionResult};
