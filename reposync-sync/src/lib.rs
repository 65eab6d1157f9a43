//! # reposync-sync
//!
//! Reconciles a local checkout with a remote branch.
//!
//! Build a [`Synchronizer`] (production wiring via
//! [`Synchronizer::from_config`], or any [`CommandRunner`] / [`CommitLookup`]
//! pair) and call [`Synchronizer::sync`].

pub mod error;
pub mod git;
pub mod hosting;
pub mod runner;
pub mod synchronizer;

pub use error::{RemoteLookupError, SyncError};
pub use hosting::{CommitLookup, GitHubClient};
pub use runner::{CommandResult, CommandRunner, GitRunner};
pub use synchronizer::{PlannedAction, SyncOutcome, Synchronizer};
