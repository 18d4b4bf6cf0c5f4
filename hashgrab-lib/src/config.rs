//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `HG_*`
//! environment variables, and layering them onto a [`GrabConfig`].
//! Precedence, lowest first: built-in defaults, config files, environment,
//! explicit CLI flags.

use crate::error::HashGrabError;
use crate::hash::HashAlgorithm;
use crate::types::GrabConfig;
use crate::utils::parse_timeout;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "HG_CONFIG";

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// concurrency = 8
/// timeout = "10s"
/// hasher = "sha256"
/// user_agent = "my-mirror-checker/1.0"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default request timeout (as string, e.g., "5s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Default hash algorithm ("md5" or "sha256")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hasher: Option<String>,

    /// Default HTTP user agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Overlay the values present in this file onto `config`.
    ///
    /// Files are validated on load, so parsing here only fails for configs
    /// built by hand.
    pub fn apply_to(&self, mut config: GrabConfig) -> Result<GrabConfig> {
        let Some(defaults) = &self.defaults else {
            return Ok(config);
        };

        if let Some(concurrency) = defaults.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = &defaults.timeout {
            config.timeout = parse_timeout(timeout)?;
        }
        if let Some(hasher) = &defaults.hasher {
            config.hasher = hasher.parse()?;
        }
        if let Some(user_agent) = &defaults.user_agent {
            config.user_agent = user_agent.clone();
        }
        Ok(config)
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, not valid TOML or holds
    /// invalid values.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HashGrabError::file_error(
                path.to_string_lossy(),
                "configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            HashGrabError::file_error(
                path.to_string_lossy(),
                format!("failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            HashGrabError::config(format!("failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        if self.verbose {
            tracing::info!(path = %path.display(), "loaded config file");
        }

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks in, lowest precedence first:
    /// 1. `$XDG_CONFIG_HOME/hashgrab/config.toml` (or `~/.config/...`)
    /// 2. `~/.hashgrab.toml`
    /// 3. `./.hashgrab.toml` or `./hashgrab.toml`
    ///
    /// Files that exist but fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig> {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged_config = FileConfig::default();
        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => merged_config = self.merge_configs(merged_config, config),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping config file"),
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./.hashgrab.toml", "./hashgrab.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let path = Path::new(&home).join(".hashgrab.toml");
        path.exists().then_some(path)
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("hashgrab").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win field by field.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    hasher: higher_defaults.hasher.or(lower_defaults.hasher),
                    user_agent: higher_defaults.user_agent.or(lower_defaults.user_agent),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<()> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if defaults.concurrency == Some(0) {
            return Err(HashGrabError::config("concurrency must be at least 1"));
        }
        if let Some(timeout) = &defaults.timeout {
            parse_timeout(timeout).map_err(|_| {
                HashGrabError::config(format!(
                    "invalid timeout format '{}', use a format like '5s', '30s', '2m'",
                    timeout
                ))
            })?;
        }
        if let Some(hasher) = &defaults.hasher {
            hasher.parse::<HashAlgorithm>()?;
        }
        if let Some(user_agent) = &defaults.user_agent {
            if user_agent.trim().is_empty() {
                return Err(HashGrabError::config("user_agent cannot be empty"));
            }
        }
        Ok(())
    }
}

/// Configuration taken from `HG_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<std::time::Duration>,
    pub hasher: Option<HashAlgorithm>,
    pub user_agent: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Overlay the values present in the environment onto `config`.
    pub fn apply_to(&self, mut config: GrabConfig) -> GrabConfig {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(hasher) = self.hasher {
            config.hasher = hasher;
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }
}

/// Load configuration from the process environment.
///
/// Reads `HG_CONCURRENCY`, `HG_TIMEOUT`, `HG_HASHER`, `HG_USER_AGENT` and
/// `HG_CONFIG`. Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`] with an injectable variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("HG_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency > 0 => env_config.concurrency = Some(concurrency),
            _ => tracing::warn!(value = %val, "ignoring invalid HG_CONCURRENCY, must be >= 1"),
        }
    }

    if let Some(val) = lookup("HG_TIMEOUT") {
        match parse_timeout(&val) {
            Ok(timeout) => env_config.timeout = Some(timeout),
            Err(_) => tracing::warn!(value = %val, "ignoring invalid HG_TIMEOUT"),
        }
    }

    if let Some(val) = lookup("HG_HASHER") {
        match val.parse::<HashAlgorithm>() {
            Ok(hasher) => env_config.hasher = Some(hasher),
            Err(_) => tracing::warn!(value = %val, "ignoring invalid HG_HASHER"),
        }
    }

    if let Some(val) = lookup("HG_USER_AGENT") {
        if !val.trim().is_empty() {
            env_config.user_agent = Some(val);
        }
    }

    if let Some(val) = lookup(CONFIG_ENV_VAR) {
        if !val.trim().is_empty() {
            env_config.config = Some(val);
        }
    }

    env_config
}
