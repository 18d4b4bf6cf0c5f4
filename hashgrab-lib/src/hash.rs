//! Hash capability and the built-in digest implementations.

use crate::error::HashGrabError;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Turns fetched bytes into a digest string.
///
/// Implementations are expected to be deterministic: callers compare hashes
/// across runs.
pub trait Hasher: Send + Sync {
    /// Hash `data` and return the digest as a string.
    fn hash(&self, data: &[u8]) -> String;

    /// Fallible entry point used by the worker pool.
    ///
    /// Override this when hashing can fail; the error lands in the same
    /// result slot a fetch error would.
    fn try_hash(&self, data: &[u8]) -> Result<String, HashGrabError> {
        Ok(self.hash(data))
    }
}

/// MD5 digest as 32 lowercase hex characters. The default hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Hasher;

impl Hasher for Md5Hasher {
    fn hash(&self, data: &[u8]) -> String {
        hex::encode(Md5::digest(data))
    }
}

/// SHA-256 digest as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }
}

/// Built-in hash algorithms selectable from config files, env and CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Instantiate the matching hasher.
    pub fn into_hasher(self) -> Arc<dyn Hasher> {
        match self {
            HashAlgorithm::Md5 => Arc::new(Md5Hasher),
            HashAlgorithm::Sha256 => Arc::new(Sha256Hasher),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashGrabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(HashGrabError::config(format!(
                "unknown hasher '{}', expected md5 or sha256",
                other
            ))),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Md5 => write!(f, "md5"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}
