//! Shared balance engine for concurrent callers
//!
//! This module provides the `SharedBalanceEngine` struct, a cloneable handle
//! that many tokio tasks can submit through at once without breaking the
//! ledger invariants.
//!
//! # Design
//!
//! ```text
//! SharedBalanceEngine
//!     ├── Arc<tokio::sync::Mutex<S>>  (single writer: read-validate-append)
//!     └── Arc<LedgerView>             (read snapshot for history/balance)
//! ```
//!
//! A submission takes an owned guard on the store and moves it into a blocking
//! task that runs the whole read-validate-append step. The guard lives as long
//! as that task, not as long as the caller, so the writer stays serialized even
//! when a caller stops waiting. The entry is published to the view before the
//! guard is released.
//!
//! # Outcomes
//!
//! Each submission has one deadline (`commit_timeout`) covering both the wait
//! for the writer and the commit itself:
//! - Deadline hit while waiting for the writer: nothing was attempted, so the
//!   caller gets a definite `StorageFailure` and may retry.
//! - Deadline hit while the commit runs: the caller gets `OutcomeUnknown`. The
//!   commit may still land; it will then appear in `history()`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::{timeout_at, Instant};
use tracing::{error, warn};

use super::LedgerView;
use crate::core::engine::commit;
use crate::core::traits::LedgerStore;
use crate::types::{
    validate_amount, LedgerEntry, RejectionReason, StoreError, SubmitRequest,
};

/// Default bound on how long a caller waits for a commit
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Cloneable balance engine safe to share across tasks and threads
pub struct SharedBalanceEngine<S> {
    /// The ledger store; holding this lock is the right to commit
    store: Arc<Mutex<S>>,

    /// Committed entries as seen by readers
    view: Arc<LedgerView>,

    commit_timeout: Duration,
}

impl<S> Clone for SharedBalanceEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            view: Arc::clone(&self.view),
            commit_timeout: self.commit_timeout,
        }
    }
}

impl<S> fmt::Debug for SharedBalanceEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBalanceEngine")
            .field("entries", &self.view.len())
            .field("balance", &self.view.balance())
            .field("commit_timeout", &self.commit_timeout)
            .finish()
    }
}

impl<S: LedgerStore + 'static> SharedBalanceEngine<S> {
    /// Create a shared engine that takes ownership of `store`
    ///
    /// Existing entries in the store are loaded into the read view.
    ///
    /// # Errors
    ///
    /// Returns the store's error if its contents cannot be read.
    pub fn new(store: S, commit_timeout: Duration) -> Result<Self, StoreError> {
        let view = LedgerView::from_entries(store.read_all()?);

        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            view: Arc::new(view),
            commit_timeout,
        })
    }

    /// Bound on how long `submit` waits before reporting an unknown outcome
    pub fn commit_timeout(&self) -> Duration {
        self.commit_timeout
    }

    /// Submit a proposed entry
    ///
    /// Concurrent submissions are applied one at a time, in lock order; no two
    /// of them compute a balance from the same prior balance.
    pub async fn submit(&self, request: SubmitRequest) -> Result<LedgerEntry, RejectionReason> {
        let result = self.commit_before_deadline(request).await;
        if let Err(reason) = &result {
            warn!(
                kind = %request.kind,
                amount = %request.amount,
                reason = %reason,
                definite = reason.is_definite(),
                "Submission rejected"
            );
        }
        result
    }

    /// Submit a credit of `amount`
    pub async fn credit(&self, amount: Decimal) -> Result<LedgerEntry, RejectionReason> {
        self.submit(SubmitRequest::credit(amount)).await
    }

    /// Submit a debit of `amount`
    pub async fn debit(&self, amount: Decimal) -> Result<LedgerEntry, RejectionReason> {
        self.submit(SubmitRequest::debit(amount)).await
    }

    async fn commit_before_deadline(
        &self,
        request: SubmitRequest,
    ) -> Result<LedgerEntry, RejectionReason> {
        validate_amount(request.amount)?;

        let deadline = Instant::now() + self.commit_timeout;
        let timeout_ms = u64::try_from(self.commit_timeout.as_millis()).unwrap_or(u64::MAX);

        let guard = timeout_at(deadline, Arc::clone(&self.store).lock_owned())
            .await
            .map_err(|_| {
                RejectionReason::storage_failure(StoreError::unavailable(format!(
                    "ledger writer busy for {}ms",
                    timeout_ms
                )))
            })?;

        let view = Arc::clone(&self.view);
        let task = tokio::task::spawn_blocking(move || -> Result<LedgerEntry, RejectionReason> {
            let mut store = guard;
            let entry = commit(&mut *store, request, Utc::now())?;
            view.publish(entry.clone());
            Ok(entry)
        });

        match timeout_at(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                error!(error = %join_error, "Commit task did not complete");
                Err(RejectionReason::outcome_unknown(timeout_ms))
            }
            Err(_) => Err(RejectionReason::outcome_unknown(timeout_ms)),
        }
    }

    /// Committed entries, most recent first
    pub fn history(&self) -> Vec<LedgerEntry> {
        self.view.history()
    }

    /// Current balance; zero for an empty ledger
    pub fn balance(&self) -> Decimal {
        self.view.balance()
    }

    /// Number of committed entries
    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// The read snapshot shared by all clones of this engine
    #[cfg(test)]
    pub(crate) fn view(&self) -> &Arc<LedgerView> {
        &self.view
    }

    /// Wait until no commit is in flight
    ///
    /// After this returns, every submission that timed out with
    /// `OutcomeUnknown` before the call has either landed in `history()` or
    /// definitely failed.
    pub async fn settle(&self) {
        let _writer = self.store.lock().await;
    }
}
