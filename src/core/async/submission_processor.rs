//! Concurrent submission of request batches
//!
//! This module provides the `SubmissionProcessor` struct, which fans a batch of
//! submit requests out to tokio tasks against one `SharedBalanceEngine`.
//!
//! # Ordering
//!
//! Requests within a batch race for the engine's writer, so they are committed
//! in some serial order that need not match input order. The resulting ledger
//! is always equivalent to that serial order: the engine never lets two
//! requests compute a balance from the same prior balance.
//!
//! # Failure Handling
//!
//! Every request gets a result. A task that panics is logged and reported as
//! `OutcomeUnknown` for its request rather than dropped.

use std::sync::Arc;

use futures::future::join_all;
use tracing::error;

use super::SharedBalanceEngine;
use crate::core::traits::LedgerStore;
use crate::types::{LedgerEntry, RejectionReason, SubmitRequest};

/// Outcome of one submitted request
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    /// The request that was submitted
    pub request: SubmitRequest,

    /// The committed entry, or why it was not (or may not have been) committed
    pub result: Result<LedgerEntry, RejectionReason>,
}

/// Submits batches of requests concurrently
#[derive(Debug)]
pub struct SubmissionProcessor<S> {
    engine: Arc<SharedBalanceEngine<S>>,
}

impl<S> Clone for SubmissionProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S: LedgerStore + 'static> SubmissionProcessor<S> {
    pub fn new(engine: Arc<SharedBalanceEngine<S>>) -> Self {
        Self { engine }
    }

    /// Submit every request in `batch` concurrently and wait for all of them
    ///
    /// Results are returned in input order, regardless of commit order.
    pub async fn process_batch(&self, batch: Vec<SubmitRequest>) -> Vec<SubmissionResult> {
        let tasks: Vec<_> = batch
            .iter()
            .map(|&request| {
                let engine = Arc::clone(&self.engine);
                tokio::spawn(async move { engine.submit(request).await })
            })
            .collect();

        let timeout_ms = u64::try_from(self.engine.commit_timeout().as_millis()).unwrap_or(u64::MAX);

        join_all(tasks)
            .await
            .into_iter()
            .zip(batch)
            .map(|(joined, request)| {
                let result = joined.unwrap_or_else(|e| {
                    error!(
                        kind = %request.kind,
                        amount = %request.amount,
                        error = %e,
                        "Submission task panicked"
                    );
                    Err(RejectionReason::outcome_unknown(timeout_ms))
                });
                SubmissionResult { request, result }
            })
            .collect()
    }
}
