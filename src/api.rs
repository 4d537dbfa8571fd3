//! Request contract for a transport layer
//!
//! `LedgerApi` maps the four ledger operations onto status classes, HTTP-style
//! status codes and JSON bodies, so an HTTP (or any other) front end only has
//! to route requests and copy the response out. No transport lives here.
//!
//! | Operation | Success | Client error | Server error |
//! |-----------|---------|--------------|--------------|
//! | `credit`  | 200     | 400 invalid amount | 500 storage, 503 busy, 504 unknown |
//! | `debit`   | 200     | 400 invalid amount / insufficient balance | as above |
//! | `balance` | 200     | - | - |
//! | `history` | 200     | - | - |

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::core::traits::LedgerStore;
use crate::core::SharedBalanceEngine;
use crate::types::{parse_amount, EntryKind, RejectionReason, StoreError, SubmitRequest};

/// Coarse outcome class of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusClass {
    Ok,
    ClientError,
    ServerError,
}

/// Transport-neutral response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: StatusClass,

    /// HTTP-style status code
    pub code: u16,

    /// Human-readable summary
    pub message: String,

    /// JSON payload
    pub body: Value,
}

impl ApiResponse {
    fn ok(message: impl Into<String>, body: Value) -> Self {
        Self {
            status: StatusClass::Ok,
            code: 200,
            message: message.into(),
            body,
        }
    }

    /// Map a rejection onto its response
    ///
    /// Definite business rejections are client errors; anything involving the
    /// store is a server error, with an unknown outcome kept distinct from a
    /// definite failure.
    pub fn from_rejection(reason: &RejectionReason) -> Self {
        let (status, code, message) = match reason {
            RejectionReason::InvalidAmount { .. } => {
                (StatusClass::ClientError, 400, "Please enter a valid amount")
            }
            RejectionReason::InsufficientBalance { .. } => {
                (StatusClass::ClientError, 400, "Insufficient balance")
            }
            RejectionReason::StorageFailure {
                source: StoreError::Unavailable { .. },
            } => (StatusClass::ServerError, 503, "Ledger temporarily unavailable"),
            RejectionReason::StorageFailure { .. } => {
                (StatusClass::ServerError, 500, "Internal Server Error")
            }
            RejectionReason::OutcomeUnknown { .. } => {
                (StatusClass::ServerError, 504, "Outcome unknown, check history before retrying")
            }
        };

        Self {
            status,
            code,
            message: message.to_string(),
            body: json!({
                "error": reason.to_string(),
                "definite": reason.is_definite(),
                "retryable": reason.is_retryable(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StatusClass::Ok
    }
}

/// Ledger operations in request/response form
#[derive(Debug)]
pub struct LedgerApi<S> {
    engine: SharedBalanceEngine<S>,
}

impl<S> Clone for LedgerApi<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<S: LedgerStore + 'static> LedgerApi<S> {
    pub fn new(engine: SharedBalanceEngine<S>) -> Self {
        Self { engine }
    }

    /// `POST credit` with a raw amount
    pub async fn credit(&self, raw_amount: &str) -> ApiResponse {
        self.submit(EntryKind::Credit, raw_amount).await
    }

    /// `POST debit` with a raw amount
    pub async fn debit(&self, raw_amount: &str) -> ApiResponse {
        self.submit(EntryKind::Debit, raw_amount).await
    }

    /// `GET balance`
    pub fn balance(&self) -> ApiResponse {
        let balance = self.engine.balance();
        ApiResponse::ok(
            format!("Total Balance: {}", balance),
            json!({ "balance": balance }),
        )
    }

    /// `GET history`, most recent first
    pub fn history(&self) -> ApiResponse {
        let entries = self.engine.history();
        let count = entries.len();
        ApiResponse::ok(format!("{} entries", count), json!(entries))
    }

    async fn submit(&self, kind: EntryKind, raw_amount: &str) -> ApiResponse {
        let outcome = match parse_amount(raw_amount) {
            Ok(amount) => self.engine.submit(SubmitRequest { kind, amount }).await,
            Err(reason) => Err(reason),
        };

        let response = match outcome {
            Ok(entry) => ApiResponse::ok(
                format!("{} successful. Amount: {}", kind, entry.amount),
                json!({
                    "amount": entry.amount,
                    "balance": entry.balance,
                    "sequence": entry.sequence,
                }),
            ),
            Err(reason) => ApiResponse::from_rejection(&reason),
        };

        if response.status == StatusClass::ServerError {
            error!(kind = %kind, code = response.code, message = %response.message, "Request failed");
        } else {
            debug!(kind = %kind, code = response.code, message = %response.message, "Request handled");
        }
        response
    }

    /// Balance as a number, for callers that skip the response wrapper
    pub fn current_balance(&self) -> Decimal {
        self.engine.balance()
    }
}
