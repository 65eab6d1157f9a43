//! Error types for reposync-sync.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use reposync_core::InvalidRepositoryUrl;

/// Terminal failures of a sync run. None are retried within the run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote URL does not name an `<owner>/<repo>` pair.
    #[error(transparent)]
    InvalidRepositoryUrl(#[from] InvalidRepositoryUrl),

    #[error("failed to clone {url}: {stderr}")]
    CloneFailed { url: String, stderr: String },

    #[error("failed to fetch from origin: {stderr}")]
    FetchFailed { stderr: String },

    #[error("failed to check out branch '{branch}': {stderr}")]
    CheckoutFailed { branch: String, stderr: String },

    /// Local modifications block a checkout or pull and `auto_stash` is off.
    #[error("working tree at {path} has local changes; commit them or enable options.auto_stash")]
    DirtyWorkingTree { path: PathBuf },

    #[error("failed to stash local changes: {stderr}")]
    StashFailed { stderr: String },

    #[error("failed to pull branch '{branch}': {stderr}")]
    PullFailed { branch: String, stderr: String },

    /// A mutating git command exceeded the configured timeout and was killed.
    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    CommandTimedOut { command: String, timeout: Duration },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Failure of the hosting-API commit lookup.
///
/// Never fatal: the synchronizer logs it and decides from local git state.
#[derive(Debug, Error)]
pub enum RemoteLookupError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unreadable response from {url}: {message}")]
    Body { url: String, message: String },

    #[error("response from {url} carries no commit sha")]
    MissingSha { url: String },
}
