//! Fetch capability and the default HTTP implementation.
//!
//! The worker pool only ever talks to the [`Fetcher`] trait. [`HttpFetcher`]
//! is the built-in implementation on top of `reqwest`; tests and embedders
//! can plug in anything that turns a URL into bytes.

use crate::error::HashGrabError;
use crate::utils::normalize_url;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Default per-request timeout for [`HttpFetcher`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header sent by [`HttpFetcher`].
pub const DEFAULT_USER_AGENT: &str = concat!("hashgrab/", env!("CARGO_PKG_VERSION"));

/// Produces the raw bytes behind a URL.
///
/// An error means "this URL failed"; it is reported in that URL's result and
/// never affects other URLs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP(S) fetcher backed by a shared `reqwest::Client`.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout and user agent.
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a fetcher with a custom timeout and user agent.
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                HashGrabError::network_with_detail("failed to create HTTP client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// Wrap an already configured client.
    pub fn with_client(http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    /// Per-request timeout this fetcher was built with.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_request_error(&self, url: &str, err: reqwest::Error) -> HashGrabError {
        if err.is_timeout() {
            HashGrabError::timeout(format!("GET {}", url), self.timeout)
        } else if err.is_connect() {
            HashGrabError::network_with_detail("connection failed", err.to_string())
        } else if err.is_body() || err.is_decode() {
            HashGrabError::network_with_detail("failed to read response body", err.to_string())
        } else {
            HashGrabError::network_with_detail("request failed", err.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = normalize_url(url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_request_error(&url, e))?;

        let status = response.status();
        tracing::trace!(url = %url, status = status.as_u16(), "received response");
        if !status.is_success() {
            return Err(HashGrabError::status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_request_error(&url, e))?;
        Ok(body.to_vec())
    }
}
