//! The worker pool coordinating a run.
//!
//! [`HashGrab`] owns the configuration and the two capabilities. `run`
//! launches one task per URL behind a [`Gate`], tracks outstanding tasks
//! with a `TaskTracker` and closes the returned [`ResultStream`] once every
//! task has sent its result.

use crate::error::HashGrabError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::gate::Gate;
use crate::hash::Hasher;
use crate::task::{run_task, Admission, TaskContext};
use crate::types::{GrabConfig, GrabResult};
use crate::Result;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Capacity of the result channel. Tasks block on send while the consumer
/// has not taken the previous result.
const RESULT_BUFFER: usize = 1;

/// Bounded fetch-and-hash worker pool.
///
/// # Example
///
/// ```rust,no_run
/// use futures::StreamExt;
/// use hashgrab_lib::HashGrab;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut results = HashGrab::new()?
///         .with_concurrency(4)
///         .run(["example.com", "https://www.rust-lang.org"])?;
///
///     while let Some(result) = results.next().await {
///         match result.error() {
///             None => println!("{} {}", result.url, result.hash()),
///             Some(e) => println!("couldn't fetch {}: {}", result.url, e),
///         }
///     }
///     Ok(())
/// }
/// ```
///
/// Setters consume and return the pool, and every run takes its own
/// snapshot of the fetcher and hasher, so a run in flight is never affected
/// by reconfiguration.
#[derive(Clone)]
pub struct HashGrab {
    config: GrabConfig,
    fetcher: Arc<dyn Fetcher>,
    hasher: Arc<dyn Hasher>,
}

impl HashGrab {
    /// Create a pool with default configuration.
    ///
    /// Defaults:
    /// - Concurrency: number of available processing units
    /// - Fetcher: [`HttpFetcher`] with a 30 second timeout
    /// - Hasher: MD5
    pub fn new() -> Result<Self> {
        Self::with_config(GrabConfig::default())
    }

    /// Create a pool from `config`, building the default HTTP fetcher and
    /// the configured built-in hasher.
    pub fn with_config(config: GrabConfig) -> Result<Self> {
        let fetcher = HttpFetcher::with_config(config.timeout, &config.user_agent)?;
        let hasher = config.hasher.into_hasher();
        Ok(Self::with_capabilities(config, Arc::new(fetcher), hasher))
    }

    /// Create a pool with explicit fetcher and hasher implementations.
    pub fn with_capabilities(
        config: GrabConfig,
        fetcher: Arc<dyn Fetcher>,
        hasher: Arc<dyn Hasher>,
    ) -> Self {
        Self {
            config,
            fetcher,
            hasher,
        }
    }

    /// Set the maximum number of concurrent tasks.
    ///
    /// Zero is accepted here and rejected when a run starts.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Replace the fetcher.
    pub fn with_fetcher<F: Fetcher + 'static>(mut self, fetcher: F) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    /// Replace the hasher.
    pub fn with_hasher<H: Hasher + 'static>(mut self, hasher: H) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// Current concurrency limit.
    pub fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    /// Get the current configuration.
    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    /// Fetch and hash every URL, streaming results as they complete.
    ///
    /// Returns immediately. Each input URL, duplicates included, produces
    /// exactly one result; results arrive in completion order. Must be
    /// called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`HashGrabError::Config`] when the concurrency limit is zero.
    /// No task is launched in that case.
    pub fn run<I, S>(&self, urls: I) -> Result<ResultStream>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_with_cancel(urls, CancellationToken::new())
    }

    /// Like [`run`](Self::run), stopping early when `cancel` fires.
    ///
    /// In-flight fetches are abandoned and URLs still waiting for the gate
    /// are not fetched; each of them still yields a
    /// [`HashGrabError::Cancelled`] result, so the count of results always
    /// equals the count of URLs.
    pub fn run_with_cancel<I, S>(
        &self,
        urls: I,
        cancel: CancellationToken,
    ) -> Result<ResultStream>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.validate()?;

        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        let expected = urls.len();
        let (results, rx) = mpsc::channel(RESULT_BUFFER);

        let ctx = TaskContext {
            fetcher: Arc::clone(&self.fetcher),
            hasher: Arc::clone(&self.hasher),
            results,
            cancel,
        };
        tokio::spawn(supervise(urls, Gate::new(self.config.concurrency), ctx));

        Ok(ResultStream { rx, expected })
    }
}

/// Launch one task per URL in input order, then close the stream once
/// every task has finished.
///
/// Acquiring the permit before spawning is what bounds the pool: the loop
/// stalls at `limit` outstanding tasks until one of them finishes.
/// Cancellation closes the gate, so a stalled loop wakes up and every URL
/// left over is admitted as cancelled.
async fn supervise(urls: Vec<String>, gate: Gate, ctx: TaskContext) {
    let tracker = TaskTracker::new();
    tracing::info!(
        urls = urls.len(),
        concurrency = gate.capacity(),
        "starting run"
    );

    let closer = tokio::spawn({
        let gate = gate.clone();
        let cancel = ctx.cancel.clone();
        async move {
            cancel.cancelled().await;
            tracing::debug!("run cancelled, closing gate");
            gate.close();
        }
    });

    for url in urls {
        let completion = tracker.token();
        // The closer may not have run yet when cancellation was already
        // requested, so a granted permit is checked against the token too.
        let admission = match gate.acquire().await {
            Some(permit) if !ctx.cancel.is_cancelled() => Admission::Admitted(permit),
            _ => Admission::Cancelled,
        };
        tracing::debug!(url = %url, in_flight = gate.occupied(), "launching task");
        tokio::spawn(run_task(url, ctx.clone(), admission, completion));
    }

    tracker.close();
    tracker.wait().await;
    closer.abort();
    // Dropping the last sender closes the stream. Every task has already
    // sent its result and dropped its own sender by now.
    drop(ctx);
    tracing::info!("run finished");
}

/// Results of one run, in completion order.
///
/// Ends once every URL has produced its result. Dropping the stream early
/// does not stop the run; remaining results are discarded.
#[derive(Debug)]
pub struct ResultStream {
    rx: mpsc::Receiver<GrabResult>,
    expected: usize,
}

impl ResultStream {
    /// Receive the next result, or `None` once the run is complete.
    pub async fn recv(&mut self) -> Option<GrabResult> {
        self.rx.recv().await
    }

    /// Number of results this stream will yield in total.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Drain the stream into a vector.
    pub async fn collect_all(mut self) -> Vec<GrabResult> {
        let mut results = Vec::with_capacity(self.expected);
        while let Some(result) = self.recv().await {
            results.push(result);
        }
        results
    }
}

impl Stream for ResultStream {
    type Item = GrabResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
