//! Git command vocabulary over a [`CommandRunner`].
//!
//! Mutating commands return the raw [`CommandResult`] so the caller decides
//! how a failure maps onto [`crate::SyncError`]. Queries fold failures into a
//! conservative answer and log why.

use std::path::Path;
use std::time::Duration;

use chrono::Local;

use crate::runner::{CommandResult, CommandRunner};

/// Name of the remote every command targets.
pub const REMOTE: &str = "origin";

/// A checkout directory plus the runner and timeout used for every command in it.
pub struct Git<'a, R: ?Sized> {
    runner: &'a R,
    workdir: &'a Path,
    timeout: Duration,
}

impl<'a, R: CommandRunner + ?Sized> Git<'a, R> {
    pub fn new(runner: &'a R, workdir: &'a Path, timeout: Duration) -> Self {
        Self {
            runner,
            workdir,
            timeout,
        }
    }

    fn run(&self, args: &[&str]) -> CommandResult {
        self.runner.run(args, self.workdir, self.timeout)
    }

    /// `true` when `workdir` already holds a checkout.
    pub fn has_checkout(&self) -> bool {
        self.workdir.join(".git").exists()
    }

    // -- mutating ----------------------------------------------------------

    /// `git clone --branch <branch> <url> .`; the workdir must already exist.
    ///
    /// Cloning straight onto `branch` leaves the new checkout on the target
    /// whatever the remote's default branch is.
    pub fn clone_into(&self, url: &str, branch: &str) -> CommandResult {
        self.run(&["clone", "--branch", branch, url, "."])
    }

    pub fn fetch(&self) -> CommandResult {
        self.run(&["fetch", REMOTE])
    }

    /// `git stash push` with a timestamped message so the entry is recognisable later.
    pub fn stash(&self) -> CommandResult {
        let message = format!(
            "reposync autostash {}",
            Local::now().format("%Y-%m-%dT%H:%M:%S")
        );
        self.run(&["stash", "push", "-m", &message])
    }

    pub fn checkout(&self, branch: &str) -> CommandResult {
        self.run(&["checkout", branch])
    }

    pub fn pull(&self, branch: &str) -> CommandResult {
        self.run(&["pull", REMOTE, branch])
    }

    // -- queries -----------------------------------------------------------

    /// Current branch name; `None` when the query fails or HEAD is detached.
    pub fn current_branch(&self) -> Option<String> {
        let result = self.run(&["branch", "--show-current"]);
        if !result.success {
            tracing::warn!(stderr = %result.stderr, "failed to determine current branch");
            return None;
        }
        Some(result.stdout).filter(|b| !b.is_empty())
    }

    /// `git status --porcelain` is empty. A failed query counts as dirty.
    pub fn is_clean(&self) -> bool {
        let result = self.run(&["status", "--porcelain"]);
        if !result.success {
            tracing::warn!(stderr = %result.stderr, "failed to query working tree status; assuming dirty");
            return false;
        }
        result.stdout.trim().is_empty()
    }

    /// Commits on `origin/<branch>` not reachable from `local_ref`.
    ///
    /// `Err` carries the reason the count could not be determined.
    pub fn behind_count(&self, local_ref: &str, branch: &str) -> Result<u64, String> {
        let range = format!("{local_ref}..{REMOTE}/{branch}");
        let result = self.run(&["rev-list", "--count", &range]);
        if !result.success {
            return Err(result.stderr);
        }
        result
            .stdout
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("unexpected rev-list output '{}': {e}", result.stdout))
    }

    /// Commit id `rev` resolves to; `None` when it does not resolve.
    pub fn rev_parse(&self, rev: &str) -> Option<String> {
        let result = self.run(&["rev-parse", rev]);
        if !result.success {
            tracing::debug!(rev, stderr = %result.stderr, "rev-parse failed");
            return None;
        }
        Some(result.stdout).filter(|id| !id.is_empty())
    }
}
