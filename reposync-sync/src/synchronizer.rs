//! Reconciliation state machine.
//!
//! ```text
//! Start → ParseUrl → EnsureClone → FetchRemote → EnsureBranch
//!       → EvaluatePullNeed → { Pull → Updated | UpToDate }
//! ```
//!
//! Any failing step ends the run with that step's [`SyncError`]; nothing is
//! retried. The branch is always settled before the pull decision.
//!
//! In dry-run mode every mutating step (clone, fetch, stash, checkout, pull)
//! is recorded as a [`PlannedAction`] instead of executed; read-only queries
//! still run.

use std::fmt;

use reposync_core::{RepoSlug, SyncConfig};

use crate::error::{io_err, SyncError};
use crate::git::{Git, REMOTE};
use crate::hosting::{CommitLookup, GitHubClient};
use crate::runner::{CommandResult, CommandRunner, GitRunner};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// A mutating step, as executed or as planned in dry-run mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Clone { url: String, branch: String },
    Fetch,
    Stash,
    Checkout { branch: String },
    Pull { branch: String },
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::Clone { url, branch } => {
                write!(f, "git clone --branch {branch} {url} .")
            }
            PlannedAction::Fetch => write!(f, "git fetch {REMOTE}"),
            PlannedAction::Stash => write!(f, "git stash push"),
            PlannedAction::Checkout { branch } => write!(f, "git checkout {branch}"),
            PlannedAction::Pull { branch } => write!(f, "git pull {REMOTE} {branch}"),
        }
    }
}

/// Successful end state of [`Synchronizer::sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A pull ran.
    Updated {
        previous_head: Option<String>,
        current_head: Option<String>,
        /// Local changes were stashed during this run.
        stashed: bool,
    },
    /// Nothing to pull.
    UpToDate,
    /// Dry run: the mutating steps that would have run, in order.
    Planned(Vec<PlannedAction>),
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Updated {
                previous_head,
                current_head,
                stashed,
            } => {
                write!(
                    f,
                    "updated {} -> {}",
                    short(previous_head.as_deref()),
                    short(current_head.as_deref())
                )?;
                if *stashed {
                    write!(f, " (local changes stashed)")?;
                }
                Ok(())
            }
            SyncOutcome::UpToDate => write!(f, "already up to date"),
            SyncOutcome::Planned(actions) if actions.is_empty() => {
                write!(f, "nothing to do")
            }
            SyncOutcome::Planned(actions) => write!(f, "{} step(s) planned", actions.len()),
        }
    }
}

fn short(id: Option<&str>) -> &str {
    match id {
        Some(id) => id.get(..12).unwrap_or(id),
        None => "unknown",
    }
}

/// Why a pull is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PullReason {
    Forced,
    Behind(u64),
    /// The behind-count could not be determined; pull to stay fresh.
    Unknown,
}

/// Mutable bookkeeping for one run.
#[derive(Debug, Default)]
struct RunState {
    planned: Vec<PlannedAction>,
    /// Local changes were stashed (or, in dry-run, a stash is planned).
    stashed: bool,
    /// Dry-run only: a checkout was planned, so HEAD is not yet the target branch.
    checkout_pending: bool,
}

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

/// Keeps the checkout at `config.local_path` in line with `origin/<branch>`.
pub struct Synchronizer<R, L> {
    config: SyncConfig,
    runner: R,
    lookup: L,
}

impl Synchronizer<GitRunner, GitHubClient> {
    /// Production wiring: system `git` plus the configured hosting API.
    pub fn from_config(config: SyncConfig) -> Result<Self, SyncError> {
        let runner = GitRunner::new()?;
        let lookup = GitHubClient::from_config(&config);
        Ok(Self::new(config, runner, lookup))
    }
}

impl<R: CommandRunner, L: CommitLookup> Synchronizer<R, L> {
    pub fn new(config: SyncConfig, runner: R, lookup: L) -> Self {
        Self {
            config,
            runner,
            lookup,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Run one reconciliation pass.
    pub fn sync(&self) -> Result<SyncOutcome, SyncError> {
        let config = &self.config;
        let slug = RepoSlug::parse(&config.url).map_err(|err| {
            tracing::error!(url = %config.url, error = %err, "cannot derive owner/repo from URL");
            SyncError::from(err)
        })?;

        tracing::info!(
            repo = %slug,
            branch = %config.branch,
            path = %config.local_path.display(),
            dry_run = config.dry_run,
            "starting repository synchronization"
        );

        let git = Git::new(&self.runner, &config.local_path, config.command_timeout);
        let mut state = RunState::default();

        if !git.has_checkout() {
            if config.dry_run {
                // Nothing to inspect without a checkout. The clone lands on the
                // target branch, so no checkout is planned; the pull is an upper bound.
                self.apply(&git, &mut state, self.clone_action())?;
                self.apply(&git, &mut state, PlannedAction::Fetch)?;
                self.apply(&git, &mut state, PlannedAction::Pull { branch: config.branch.clone() })?;
                return Ok(SyncOutcome::Planned(state.planned));
            }
            self.ensure_clone(&git, &mut state)?;
        }

        tracing::info!("fetching remote changes");
        self.apply(&git, &mut state, PlannedAction::Fetch)?;

        self.ensure_branch(&git, &mut state)?;

        let local_ref = if state.checkout_pending {
            config.branch.as_str()
        } else {
            "HEAD"
        };

        let Some(reason) = self.pull_reason(&git, local_ref) else {
            tracing::info!("no remote changes detected");
            return Ok(self.finish(state, SyncOutcome::UpToDate));
        };

        let previous_head = git.rev_parse(local_ref);
        let remote_head = match self.lookup.latest_commit(&slug, &config.branch) {
            Ok(sha) => Some(sha),
            Err(err) => {
                tracing::warn!(error = %err, "remote commit lookup failed; deciding from local git state");
                None
            }
        };
        tracing::info!(
            local = short(previous_head.as_deref()),
            remote = short(remote_head.as_deref()),
            reason = ?reason,
            "pull needed"
        );

        if reason == PullReason::Unknown && previous_head.is_some() && previous_head == remote_head {
            tracing::info!("hosting API reports the local head is current; skipping pull");
            return Ok(self.finish(state, SyncOutcome::UpToDate));
        }

        if !state.stashed && !git.is_clean() {
            self.stash_or_refuse(&git, &mut state)?;
        }

        tracing::info!(branch = %config.branch, "pulling latest changes");
        self.apply(&git, &mut state, PlannedAction::Pull { branch: config.branch.clone() })?;

        if config.dry_run {
            return Ok(SyncOutcome::Planned(state.planned));
        }

        let current_head = git.rev_parse("HEAD");
        tracing::info!(
            from = short(previous_head.as_deref()),
            to = short(current_head.as_deref()),
            "repository synchronized"
        );
        Ok(SyncOutcome::Updated {
            previous_head,
            current_head,
            stashed: state.stashed,
        })
    }

    // -- steps -------------------------------------------------------------

    fn ensure_clone(
        &self,
        git: &Git<'_, R>,
        state: &mut RunState,
    ) -> Result<(), SyncError> {
        let path = &self.config.local_path;
        tracing::info!(url = %self.config.url, path = %path.display(), "no checkout found; cloning");
        std::fs::create_dir_all(path).map_err(|e| io_err(path, e))?;
        self.apply(git, state, self.clone_action())?;
        tracing::info!("repository cloned");
        Ok(())
    }

    fn clone_action(&self) -> PlannedAction {
        PlannedAction::Clone {
            url: self.config.url.clone(),
            branch: self.config.branch.clone(),
        }
    }

    fn ensure_branch(
        &self,
        git: &Git<'_, R>,
        state: &mut RunState,
    ) -> Result<(), SyncError> {
        let target = &self.config.branch;
        match git.current_branch() {
            Some(current) if current == *target => {
                tracing::debug!(branch = %target, "already on target branch");
                return Ok(());
            }
            Some(current) => {
                tracing::info!(from = %current, to = %target, "switching branch");
            }
            None => {
                tracing::warn!(to = %target, "current branch unknown; checking out target");
            }
        }

        if !git.is_clean() {
            self.stash_or_refuse(git, state)?;
        }
        self.apply(git, state, PlannedAction::Checkout { branch: target.clone() })?;
        state.checkout_pending = self.config.dry_run;
        Ok(())
    }

    fn pull_reason(
        &self,
        git: &Git<'_, R>,
        local_ref: &str,
    ) -> Option<PullReason> {
        if self.config.force_pull {
            tracing::info!("force pull requested");
            return Some(PullReason::Forced);
        }
        match git.behind_count(local_ref, &self.config.branch) {
            Ok(0) => None,
            Ok(n) => {
                tracing::info!(behind = n, "local branch is behind remote");
                Some(PullReason::Behind(n))
            }
            Err(reason) => {
                tracing::warn!(%reason, "could not determine whether behind remote; assuming pull needed");
                Some(PullReason::Unknown)
            }
        }
    }

    fn stash_or_refuse(
        &self,
        git: &Git<'_, R>,
        state: &mut RunState,
    ) -> Result<(), SyncError> {
        if !self.config.auto_stash {
            let err = SyncError::DirtyWorkingTree {
                path: self.config.local_path.clone(),
            };
            tracing::error!(error = %err, "working tree is not clean");
            return Err(err);
        }
        tracing::info!("stashing local changes");
        self.apply(git, state, PlannedAction::Stash)?;
        state.stashed = true;
        Ok(())
    }

    /// Execute (or, in dry-run, record) one mutating step.
    fn apply(
        &self,
        git: &Git<'_, R>,
        state: &mut RunState,
        action: PlannedAction,
    ) -> Result<(), SyncError> {
        if self.config.dry_run {
            tracing::info!(action = %action, "[dry-run] would run");
            state.planned.push(action);
            return Ok(());
        }

        let result = match &action {
            PlannedAction::Clone { url, branch } => git.clone_into(url, branch),
            PlannedAction::Fetch => git.fetch(),
            PlannedAction::Stash => git.stash(),
            PlannedAction::Checkout { branch } => git.checkout(branch),
            PlannedAction::Pull { branch } => git.pull(branch),
        };
        self.check(action, result)
    }

    fn check(&self, action: PlannedAction, result: CommandResult) -> Result<(), SyncError> {
        if result.success {
            if !result.stdout.is_empty() {
                tracing::debug!(command = %action, output = %result.stdout, "command output");
            }
            return Ok(());
        }

        let err = if result.timed_out {
            SyncError::CommandTimedOut {
                command: action.to_string(),
                timeout: self.config.command_timeout,
            }
        } else {
            let stderr = result.stderr;
            match action {
                PlannedAction::Clone { url, .. } => SyncError::CloneFailed { url, stderr },
                PlannedAction::Fetch => SyncError::FetchFailed { stderr },
                PlannedAction::Stash => SyncError::StashFailed { stderr },
                PlannedAction::Checkout { branch } => SyncError::CheckoutFailed { branch, stderr },
                PlannedAction::Pull { branch } => SyncError::PullFailed { branch, stderr },
            }
        };
        tracing::error!(error = %err, "synchronization step failed");
        Err(err)
    }

    fn finish(&self, state: RunState, outcome: SyncOutcome) -> SyncOutcome {
        if self.config.dry_run {
            SyncOutcome::Planned(state.planned)
        } else {
            outcome
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_actions_render_as_git_commands() {
        assert_eq!(
            PlannedAction::Clone {
                url: "https://github.com/octo/widgets.git".into(),
                branch: "main".into(),
            }
            .to_string(),
            "git clone --branch main https://github.com/octo/widgets.git ."
        );
        assert_eq!(PlannedAction::Fetch.to_string(), "git fetch origin");
        assert_eq!(
            PlannedAction::Pull { branch: "main".into() }.to_string(),
            "git pull origin main"
        );
    }

    #[test]
    fn outcome_summary_shortens_commit_ids() {
        let outcome = SyncOutcome::Updated {
            previous_head: Some("0123456789abcdef0123".into()),
            current_head: Some("fedcba9876543210fedc".into()),
            stashed: true,
        };
        assert_eq!(
            outcome.to_string(),
            "updated 0123456789ab -> fedcba987654 (local changes stashed)"
        );
        assert_eq!(SyncOutcome::UpToDate.to_string(), "already up to date");
        assert_eq!(SyncOutcome::Planned(vec![]).to_string(), "nothing to do");
    }
}
