//! External command execution.
//!
//! [`CommandRunner`] is the seam between the synchronizer and the `git`
//! binary; tests substitute a scripted fake. [`GitRunner`] is the production
//! implementation.
//!
//! ## `GitRunner::run` protocol
//!
//! 1. Build the command: `GIT_TERMINAL_PROMPT=0`, null stdin, piped output.
//! 2. Spawn inside a private current-thread runtime (`kill_on_drop`).
//! 3. Race completion against the timeout; on expiry the child is dropped,
//!    which kills it.
//! 4. Trim captured output into a [`CommandResult`].

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Command result
// ---------------------------------------------------------------------------

/// Outcome of one external command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// The command was killed after exceeding its timeout.
    pub timed_out: bool,
}

impl CommandResult {
    /// Successful exit with the given standard output.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// Unsuccessful exit with the given standard error.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    /// Killed after `timeout`.
    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            stderr: format!("command timed out after {}s", timeout.as_secs()),
            timed_out: true,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Runner trait
// ---------------------------------------------------------------------------

/// Runs one command (arguments only; the program is the runner's) in `cwd`.
///
/// Implementations never panic or return early on failure; every problem is
/// folded into an unsuccessful [`CommandResult`].
pub trait CommandRunner {
    fn run(&self, args: &[&str], cwd: &Path, timeout: Duration) -> CommandResult;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, args: &[&str], cwd: &Path, timeout: Duration) -> CommandResult {
        (**self).run(args, cwd, timeout)
    }
}

// ---------------------------------------------------------------------------
// GitRunner
// ---------------------------------------------------------------------------

/// Spawns the system `git` (or another program, see [`GitRunner::with_program`]).
pub struct GitRunner {
    program: OsString,
    runtime: tokio::runtime::Runtime,
}

impl GitRunner {
    pub fn new() -> Result<Self, SyncError> {
        Self::with_program("git")
    }

    /// Runner for an arbitrary program; `git` in production.
    pub fn with_program(program: impl Into<OsString>) -> Result<Self, SyncError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| io_err("tokio-runtime", e))?;
        Ok(Self {
            program: program.into(),
            runtime,
        })
    }

    fn display(&self, args: &[&str]) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl CommandRunner for GitRunner {
    fn run(&self, args: &[&str], cwd: &Path, timeout: Duration) -> CommandResult {
        let command_line = self.display(args);
        tracing::debug!(command = %command_line, cwd = %cwd.display(), "running command");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let outcome = self.runtime.block_on(async {
            let child = cmd.spawn()?;
            Ok::<_, std::io::Error>(tokio::time::timeout(timeout, child.wait_with_output()).await)
        });

        match outcome {
            Err(err) => {
                tracing::error!(command = %command_line, error = %err, "failed to spawn command");
                CommandResult::failed(format!("failed to spawn {command_line}: {err}"))
            }
            Ok(Err(_elapsed)) => {
                tracing::error!(
                    command = %command_line,
                    timeout_secs = timeout.as_secs(),
                    "command timed out"
                );
                CommandResult::timed_out(timeout)
            }
            Ok(Ok(Err(err))) => {
                tracing::error!(command = %command_line, error = %err, "failed to collect command output");
                CommandResult::failed(err.to_string())
            }
            Ok(Ok(Ok(output))) => {
                let result = CommandResult {
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                    timed_out: false,
                };
                tracing::debug!(
                    command = %command_line,
                    status = %output.status,
                    "command finished"
                );
                result
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
