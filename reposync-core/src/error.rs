//! Error types for reposync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading, validating or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// `write_template_at` refuses to clobber an existing file.
    #[error("config already exists at {path}; refusing to overwrite")]
    AlreadyExists { path: PathBuf },

    /// A field parsed but holds a value the synchronizer cannot work with.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// A path starts with `~` but `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}

/// The remote URL does not name an `<owner>/<repo>` pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repository URL '{url}': {reason}")]
pub struct InvalidRepositoryUrl {
    pub url: String,
    pub reason: &'static str,
}
