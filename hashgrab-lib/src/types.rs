//! Core data types: per-URL results and pool configuration.

use crate::error::HashGrabError;
use crate::fetch::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::hash::HashAlgorithm;
use crate::utils::available_parallelism;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Outcome of fetching and hashing one URL.
///
/// Exactly one `GrabResult` is produced per input URL. The outcome is either
/// the digest or the error that stopped this URL, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct GrabResult {
    /// The URL exactly as it was passed to `run`.
    pub url: String,

    /// Digest on success, the captured failure otherwise.
    pub outcome: Result<String, HashGrabError>,
}

impl GrabResult {
    /// Successful result carrying `hash`.
    pub fn success<U: Into<String>, H: Into<String>>(url: U, hash: H) -> Self {
        Self {
            url: url.into(),
            outcome: Ok(hash.into()),
        }
    }

    /// Failed result carrying `error`.
    pub fn failure<U: Into<String>>(url: U, error: HashGrabError) -> Self {
        Self {
            url: url.into(),
            outcome: Err(error),
        }
    }

    /// The digest, or `""` when this URL failed.
    pub fn hash(&self) -> &str {
        self.outcome.as_deref().unwrap_or("")
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&HashGrabError> {
        self.outcome.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Serialize)]
struct GrabResultRecord<'a> {
    url: &'a str,
    hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Serialize for GrabResult {
    /// Serialises as `{"url", "hash", "error"}`, omitting `error` on success.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GrabResultRecord {
            url: &self.url,
            hash: self.hash(),
            error: self.error().map(ToString::to_string),
        }
        .serialize(serializer)
    }
}

/// Configuration for a [`HashGrab`](crate::HashGrab) pool.
///
/// Only consulted when the pool is built and when a run starts; a run in
/// flight never observes later changes.
#[derive(Debug, Clone, PartialEq)]
pub struct GrabConfig {
    /// Maximum number of URLs fetched and hashed at the same time.
    /// Default: number of available processing units. Must be at least 1.
    pub concurrency: usize,

    /// Per-request timeout for the default HTTP fetcher.
    /// Default: 30 seconds
    pub timeout: Duration,

    /// `User-Agent` sent by the default HTTP fetcher.
    pub user_agent: String,

    /// Built-in hash algorithm used when no custom hasher is installed.
    /// Default: md5
    pub hasher: HashAlgorithm,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            concurrency: available_parallelism(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            hasher: HashAlgorithm::default(),
        }
    }
}

impl GrabConfig {
    /// Set the concurrency limit. The value is stored as given and checked
    /// when a run starts.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the HTTP user agent.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Select the built-in hash algorithm.
    pub fn with_hasher(mut self, hasher: HashAlgorithm) -> Self {
        self.hasher = hasher;
        self
    }

    /// Reject settings no run can start with.
    pub fn validate(&self) -> Result<(), HashGrabError> {
        if self.concurrency == 0 {
            return Err(HashGrabError::config("concurrency must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(HashGrabError::config("timeout must be greater than zero"));
        }
        Ok(())
    }
}
