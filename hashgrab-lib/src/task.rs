//! Per-URL task processing.
//!
//! One task turns one URL into exactly one [`GrabResult`]: fetch, then hash,
//! then send. The gate permit and the completion token are owned by the task
//! and released when it returns, whichever way it returns.

use crate::error::HashGrabError;
use crate::fetch::Fetcher;
use crate::gate::GatePermit;
use crate::hash::Hasher;
use crate::types::GrabResult;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::task_tracker::TaskTrackerToken;

/// How a task got past the gate.
#[derive(Debug)]
pub(crate) enum Admission {
    /// Holds a permit; the fetch may run.
    Admitted(GatePermit),
    /// The run was cancelled before this URL got a permit.
    Cancelled,
}

/// Shared handles every task of a run needs.
#[derive(Clone)]
pub(crate) struct TaskContext {
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) hasher: Arc<dyn Hasher>,
    pub(crate) results: mpsc::Sender<GrabResult>,
    pub(crate) cancel: CancellationToken,
}

/// Run one URL to completion and send its result.
///
/// `_completion` is dropped last, after the send, so the run only counts
/// this task as finished once its result is on the channel.
pub(crate) async fn run_task(
    url: String,
    ctx: TaskContext,
    admission: Admission,
    _completion: TaskTrackerToken,
) {
    let (result, _permit) = match admission {
        Admission::Admitted(permit) => {
            let processed = AssertUnwindSafe(process_url(
                &url,
                ctx.fetcher.as_ref(),
                ctx.hasher.as_ref(),
                &ctx.cancel,
            ))
            .catch_unwind()
            .await;

            let result = processed.unwrap_or_else(|_| {
                tracing::error!(url = %url, "task panicked");
                GrabResult::failure(url.clone(), HashGrabError::internal("task panicked"))
            });
            (result, Some(permit))
        }
        Admission::Cancelled => {
            let err = HashGrabError::cancelled(&url);
            (GrabResult::failure(url, err), None)
        }
    };
    send(&ctx.results, result).await;
}

/// Fetch `url` and hash the body.
///
/// Every failure, including cancellation, is captured in the returned result.
pub async fn process_url(
    url: &str,
    fetcher: &dyn Fetcher,
    hasher: &dyn Hasher,
    cancel: &CancellationToken,
) -> GrabResult {
    let fetched = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(url, "cancelled before fetch completed");
            return GrabResult::failure(url, HashGrabError::cancelled(url));
        }
        fetched = fetcher.fetch(url) => fetched,
    };

    match fetched.and_then(|bytes| {
        tracing::trace!(url, bytes = bytes.len(), "fetched");
        hasher.try_hash(&bytes)
    }) {
        Ok(hash) => {
            tracing::debug!(url, hash = %hash, "hashed");
            GrabResult::success(url, hash)
        }
        Err(err) => {
            tracing::debug!(url, error = %err, retryable = err.is_retryable(), "task failed");
            GrabResult::failure(url, err)
        }
    }
}

async fn send(results: &mpsc::Sender<GrabResult>, result: GrabResult) {
    if let Err(unsent) = results.send(result).await {
        // Consumer dropped the stream; nothing left to deliver to.
        tracing::debug!(url = %unsent.0.url, "result stream closed, dropping result");
    }
}
