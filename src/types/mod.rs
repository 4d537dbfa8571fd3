//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `entry`: Ledger entries, entry kinds and submit requests
//! - `amount`: Amount parsing and validation at input boundaries
//! - `error`: Store errors, rejection reasons and fatal run errors

pub mod amount;
pub mod entry;
pub mod error;

pub use amount::{amount_from_f64, parse_amount, validate_amount};
pub use entry::{check_continuity, EntryKind, LedgerEntry, Sequence, SubmitRequest};
pub use error::{LedgerError, RejectionReason, StoreError};
