//! # Hashgrab Library
//!
//! Fetch a list of URLs concurrently, hash each response body and stream the
//! results back as they complete, with a hard cap on how many fetches are in
//! flight at once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hashgrab_lib::HashGrab;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut results = HashGrab::new()?.with_concurrency(8).run(["example.com"])?;
//!
//!     while let Some(result) = results.recv().await {
//!         println!("{} {}", result.url, result.hash());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`HashGrab`]: the worker pool; owns configuration and runs URLs
//! - [`Gate`]: counting semaphore bounding in-flight tasks
//! - [`Fetcher`] / [`Hasher`]: pluggable capabilities, with
//!   [`HttpFetcher`], [`Md5Hasher`] and [`Sha256Hasher`] built in
//! - [`GrabResult`]: one per input URL, success or failure
//! - [`ConfigManager`] / [`load_env_config`]: TOML and `HG_*` configuration

pub use config::{
    load_env_config, load_env_config_from, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
    CONFIG_ENV_VAR,
};
pub use error::HashGrabError;
pub use fetch::{Fetcher, HttpFetcher, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use gate::{Gate, GatePermit};
pub use grabber::{HashGrab, ResultStream};
pub use hash::{HashAlgorithm, Hasher, Md5Hasher, Sha256Hasher};
pub use task::process_url;
pub use types::{GrabConfig, GrabResult};
pub use utils::{available_parallelism, normalize_url, parse_timeout, parse_url_list};

// Cancellation token accepted by `HashGrab::run_with_cancel`.
pub use tokio_util::sync::CancellationToken;

mod config;
mod error;
mod fetch;
mod gate;
mod grabber;
mod hash;
mod task;
mod types;
mod utils;

/// Result type returned by the library's fallible operations.
pub type Result<T> = std::result::Result<T, HashGrabError>;

/// Library version, shared with the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
