//! Typed configuration for a reposync run.
//!
//! Every optional field carries its default through serde, so a config file
//! only needs `repository.url`. [`Config::validate`] runs once after loading;
//! nothing downstream re-checks or coerces values.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BRANCH: &str = "main";
/// Subdirectory of the config file's directory, so the checkout never shares
/// a directory with the config or log file.
pub const DEFAULT_LOCAL_PATH: &str = "checkout";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_LOG_MAX_FILES: usize = 5;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Minimum severity written by the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

// ---------------------------------------------------------------------------
// File sections
// ---------------------------------------------------------------------------

/// `repository:` what to track and where to put it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositorySection {
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Relative paths are resolved against the config file's directory.
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,
    /// Empty string means anonymous access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Name of an environment variable holding the token; wins over `token` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

/// `options:` reconciliation behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OptionsSection {
    pub force_pull: bool,
    pub auto_stash: bool,
    pub command_timeout_secs: u64,
}

impl Default for OptionsSection {
    fn default() -> Self {
        Self {
            force_pull: false,
            auto_stash: true,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

/// `hosting:` REST API used to look up the remote branch tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HostingSection {
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for HostingSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// `logging:` level and optional rotated log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingSection {
    pub level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub max_bytes: u64,
    pub max_files: usize,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            max_files: DEFAULT_LOG_MAX_FILES,
        }
    }
}

/// Root of the YAML config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub repository: RepositorySection,
    #[serde(default)]
    pub options: OptionsSection,
    #[serde(default)]
    pub hosting: HostingSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_owned()
}

fn default_local_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_PATH)
}

// ---------------------------------------------------------------------------
// Resolved run settings
// ---------------------------------------------------------------------------

/// Everything the synchronizer needs for one run, flattened and resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub url: String,
    pub branch: String,
    pub local_path: PathBuf,
    pub token: Option<String>,
    pub force_pull: bool,
    pub auto_stash: bool,
    /// Record mutating steps instead of running them.
    pub dry_run: bool,
    pub command_timeout: Duration,
    pub api_url: String,
    pub http_timeout: Duration,
}

impl Config {
    /// Reject values that parse but cannot drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.url.trim().is_empty() {
            return Err(ConfigError::Invalid("repository.url must not be empty".into()));
        }
        if self.repository.branch.trim().is_empty() {
            return Err(ConfigError::Invalid("repository.branch must not be empty".into()));
        }
        if self.repository.local_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("repository.local_path must not be empty".into()));
        }
        if self.options.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid("options.command_timeout_secs must be > 0".into()));
        }
        if self.hosting.timeout_secs == 0 {
            return Err(ConfigError::Invalid("hosting.timeout_secs must be > 0".into()));
        }
        if self.hosting.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("hosting.api_url must not be empty".into()));
        }
        if self.logging.max_files == 0 {
            return Err(ConfigError::Invalid("logging.max_files must be > 0".into()));
        }
        Ok(())
    }

    /// Flatten into the settings for a single run.
    pub fn sync_config(&self, dry_run: bool) -> SyncConfig {
        SyncConfig {
            url: self.repository.url.trim().to_owned(),
            branch: self.repository.branch.trim().to_owned(),
            local_path: self.repository.local_path.clone(),
            token: self
                .repository
                .token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
            force_pull: self.options.force_pull,
            auto_stash: self.options.auto_stash,
            dry_run,
            command_timeout: Duration::from_secs(self.options.command_timeout_secs),
            api_url: self.hosting.api_url.trim_end_matches('/').to_owned(),
            http_timeout: Duration::from_secs(self.hosting.timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
