//! Error handling for fetch-and-hash operations.
//!
//! Every per-URL failure is captured into that URL's [`GrabResult`](crate::GrabResult)
//! as one of these variants. Nothing here is ever fatal to the pool itself
//! except [`HashGrabError::Config`], which is raised before any task starts.

use std::time::Duration;
use thiserror::Error;

/// Main error type for hashgrab operations.
///
/// The type is `Clone` so results carrying an error can be fanned out or
/// stored without losing the original message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HashGrabError {
    /// Transport-level failure (DNS, connect, TLS, reading the body).
    #[error("network error: {message}{}", .detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    Network {
        message: String,
        detail: Option<String>,
    },

    /// The request did not complete within the configured timeout.
    #[error("timeout after {duration:?} during {operation}")]
    Timeout { operation: String, duration: Duration },

    /// The server answered with a non-success status code.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// A fetcher implementation reported its own failure.
    #[error("{message}")]
    Fetch { message: String },

    /// A hasher implementation failed on the fetched bytes.
    #[error("hash error: {message}")]
    Hash { message: String },

    /// The run was cancelled before this URL finished.
    #[error("cancelled before {url} completed")]
    Cancelled { url: String },

    /// Invalid configuration (zero concurrency, unknown hasher, ...).
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Config or URL list file could not be read.
    #[error("file error at '{path}': {message}")]
    File { path: String, message: String },

    /// Broken internal invariant.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl HashGrabError {
    /// Create a new network error with the underlying cause attached.
    pub fn network_with_detail<M: Into<String>, D: Into<String>>(message: M, detail: D) -> Self {
        Self::Network {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new HTTP status error.
    pub fn status<U: Into<String>>(url: U, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Create a fetch error carrying a free-form message.
    ///
    /// Intended for custom [`Fetcher`](crate::Fetcher) implementations.
    pub fn fetch<M: Into<String>>(message: M) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a new hash error.
    pub fn hash<M: Into<String>>(message: M) -> Self {
        Self::Hash {
            message: message.into(),
        }
    }

    /// Create a cancellation error for `url`.
    pub fn cancelled<U: Into<String>>(url: U) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether a caller could reasonably try the same URL again.
    ///
    /// hashgrab itself never retries; this is for consumers of the stream.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::Cancelled { .. }
                | Self::Status {
                    status: 429 | 500..=599,
                    ..
                }
        )
    }
}
