//! reposync core library: configuration, remote URL parsing, errors.
//!
//! - [`config`]: typed config file sections and the resolved [`SyncConfig`]
//! - [`loader`]: load / validate / write template
//! - [`remote`]: `{owner, repo}` extraction from clone URLs
//! - [`error`]: [`ConfigError`], [`InvalidRepositoryUrl`]

pub mod config;
pub mod error;
pub mod loader;
pub mod remote;

pub use config::{Config, LogLevel, SyncConfig};
pub use error::{ConfigError, InvalidRepositoryUrl};
pub use loader::{load, load_with_env, write_template_at, DEFAULT_CONFIG_FILE};
pub use remote::RepoSlug;
