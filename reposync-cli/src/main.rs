//! reposync: keep a local checkout in line with a remote branch.
//!
//! # Usage
//!
//! ```text
//! reposync [--config <path>] [--force] [--dry-run] [--verbose]
//! reposync --init-config [--config <path>]
//! ```
//!
//! Exit codes: `0` success, `1` any failure, `130` interrupted.

mod commands;
mod interrupt;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use commands::sync::SyncArgs;
use reposync_core::DEFAULT_CONFIG_FILE;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "reposync",
    version,
    about = "Keep a local git checkout synchronized with a remote branch",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, short = 'c', value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Write a template config to `--config` and exit.
    #[arg(long, conflicts_with_all = ["force", "dry_run", "verbose"])]
    init_config: bool,

    #[command(flatten)]
    sync: SyncArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    interrupt::install();

    let result = if cli.init_config {
        commands::init::run(&cli.config)
    } else {
        cli.sync.run(&cli.config)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
