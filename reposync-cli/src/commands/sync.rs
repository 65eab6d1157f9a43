//! Default mode: load the config and run one reconciliation pass.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use reposync_core::{load, write_template_at, Config, ConfigError};
use reposync_sync::{SyncOutcome, Synchronizer};

use crate::logging;

/// Flags that shape a sync run.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Pull even when the local branch is not behind.
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Report the git commands that would run without changing anything.
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Log at debug level (`RUST_LOG` still wins when set).
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl SyncArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        let config = load_or_scaffold(config_path)?;

        let mut sync_config = config.sync_config(self.dry_run);
        sync_config.force_pull |= self.force;

        let (subscriber, rotation) = logging::subscriber(&config.logging, self.verbose)
            .context("failed to set up logging")?;

        tracing::subscriber::with_default(subscriber, || {
            rotation.log();
            let synchronizer =
                Synchronizer::from_config(sync_config).context("failed to start git runner")?;
            let outcome = synchronizer.sync().context("synchronization failed")?;
            print_summary(&outcome);
            Ok(())
        })
    }
}

/// A missing config file is replaced by the template and still fails the run.
fn load_or_scaffold(path: &Path) -> Result<Config> {
    match load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound { path }) => {
            write_template_at(&path).with_context(|| {
                format!(
                    "config '{}' not found and the template could not be written",
                    path.display()
                )
            })?;
            bail!(
                "config '{}' not found; wrote a template there. Edit it and run again.",
                path.display()
            );
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to load config '{}'", path.display()))
        }
    }
}

fn print_summary(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Planned(actions) => {
            println!("[dry-run] {} {outcome}", "✓".green());
            for action in actions {
                println!("  ~  {action}");
            }
        }
        SyncOutcome::Updated { .. } => println!("{} {outcome}", "✓".green()),
        SyncOutcome::UpToDate => println!("{} {outcome}", "·".dimmed()),
    }
}
