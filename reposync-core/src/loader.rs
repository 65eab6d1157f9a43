//! Config file load and template scaffolding.
//!
//! # Load flow
//!
//! read → parse (serde defaults fill gaps) → resolve token from `token_env`
//! → resolve `~` and relative paths against the config file's directory
//! → [`Config::validate`].
//!
//! # API pattern
//!
//! - `load_with_env(path, env)`: explicit environment lookup; used in tests
//! - `load(path)`: reads the process environment, delegates to `load_with_env`

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{io_err, ConfigError};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "reposync.yaml";

/// Placeholder config written by [`write_template_at`].
pub const TEMPLATE: &str = r#"# reposync configuration
repository:
  # Remote to track. HTTPS, SSH (git@host:owner/repo) and local paths are accepted.
  url: https://github.com/your_username/your_repository.git
  branch: main
  # Checkout location; relative paths are resolved against this file's directory.
  # Keep it apart from this file and the log file: the clone needs an empty directory.
  local_path: checkout
  # Token for the hosting API. Leave empty for anonymous access.
  token: ""
  # Alternatively name an environment variable that holds the token.
  # token_env: REPOSYNC_TOKEN

options:
  force_pull: false
  auto_stash: true
  command_timeout_secs: 300

hosting:
  api_url: https://api.github.com
  timeout_secs: 30

logging:
  level: info
  file: reposync.log
  max_bytes: 10485760
  max_files: 5
"#;

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// Load, resolve and validate the config at `path`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_with_env<F>(path: &Path, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let mut config: Config = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(var) = config.repository.token_env.as_deref() {
        if let Some(token) = env(var).filter(|t| !t.trim().is_empty()) {
            config.repository.token = Some(token);
        }
    }

    let base = config_dir(path);
    config.repository.local_path = resolve_path(&config.repository.local_path, &base)?;
    config.logging.file = match config.logging.file.take() {
        Some(file) if !file.as_os_str().is_empty() => Some(resolve_path(&file, &base)?),
        _ => None,
    };

    config.validate()?;
    Ok(config)
}

/// `load_with_env` convenience wrapper over the process environment.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    load_with_env(path, |var| std::env::var(var).ok())
}

// ---------------------------------------------------------------------------
// 2. Template (atomic)
// ---------------------------------------------------------------------------

/// Atomically write [`TEMPLATE`] to `path`.
///
/// Write flow: `.tmp` sibling → `chmod 0600` (the file may hold a token) → `rename`.
/// Refuses to overwrite an existing file.
pub fn write_template_at(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_owned());
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    std::fs::write(&tmp_path, TEMPLATE).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Expand a leading `~` and anchor relative paths at `base`.
fn resolve_path(path: &Path, base: &Path) -> Result<PathBuf, ConfigError> {
    if let Ok(rest) = path.strip_prefix("~") {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        return Ok(home.join(rest));
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    if path == Path::new(".") {
        return Ok(base.to_path_buf());
    }
    Ok(base.join(path))
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
