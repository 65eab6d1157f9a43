//! Subscriber construction and size-based log file rotation.
//!
//! Events go to stdout and, when `logging.file` is set, are appended to that
//! file without ANSI colours. Once the file reaches `max_bytes` it is shifted
//! into numbered backups (`.1` newest) before being reopened, keeping at most
//! `max_files` of them.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use reposync_core::{config::LoggingSection, LogLevel};

/// What happened to the log file before it was opened.
///
/// The subscriber does not exist yet when rotation runs, so the result is
/// reported once it is installed.
#[derive(Debug)]
pub enum Rotation {
    Skipped,
    Rotated(PathBuf),
    Failed(PathBuf, io::Error),
}

impl Rotation {
    pub fn log(&self) {
        match self {
            Rotation::Skipped => {}
            Rotation::Rotated(path) => tracing::info!(path = %path.display(), "log file rotated"),
            Rotation::Failed(path, err) => {
                tracing::warn!(path = %path.display(), error = %err, "log rotation failed")
            }
        }
    }
}

/// Build the run's subscriber. `RUST_LOG` wins over the configured level.
pub fn subscriber(
    settings: &LoggingSection,
    verbose: bool,
) -> io::Result<(impl tracing::Subscriber + Send + Sync, Rotation)> {
    let level = if verbose { LogLevel::Debug } else { settings.level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let (file_layer, rotation) = match &settings.file {
        Some(path) => {
            let rotation = match rotate(path, settings.max_bytes, settings.max_files) {
                Ok(true) => Rotation::Rotated(path.clone()),
                Ok(false) => Rotation::Skipped,
                Err(err) => Rotation::Failed(path.clone(), err),
            };
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(open_append(path)?));
            (Some(layer), rotation)
        }
        None => (None, Rotation::Skipped),
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stdout))
        .with(file_layer);
    Ok((subscriber, rotation))
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Shift `path` into `path.1` (and older backups up by one) once it holds
/// `max_bytes` or more. Returns `true` when it moved.
fn rotate(path: &Path, max_bytes: u64, keep: usize) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() >= max_bytes => {}
        Ok(_) => return Ok(false),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    }

    // Free the oldest slot, then shift.
    ignore_missing(fs::remove_file(backup_path(path, keep)))?;
    for n in (1..keep).rev() {
        ignore_missing(fs::rename(backup_path(path, n), backup_path(path, n + 1)))?;
    }
    fs::rename(path, backup_path(path, 1))?;
    Ok(true)
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(path);
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
