//! Config load error-message, template-safety and resolution integration tests.

use std::fs;
use std::path::PathBuf;

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use reposync_core::{loader, ConfigError, LogLevel};

fn no_env(_: &str) -> Option<String> {
    None
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("reposync.yaml");
    let err = loader::load_with_env(&path, no_env).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config not found"));
    assert!(err.to_string().contains("reposync.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("reposync.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = loader::load_with_env(file.path(), no_env).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("reposync.yaml"), "must contain file path, got: {msg}");
}

#[test]
fn load_without_url_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("reposync.yaml");
    file.write_str("repository:\n  branch: main\n").expect("write");

    let err = loader::load_with_env(file.path(), no_env).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn load_unknown_log_level_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("reposync.yaml");
    file.write_str("repository:\n  url: https://github.com/octo/widgets\nlogging:\n  level: loud\n")
        .expect("write");

    let err = loader::load_with_env(file.path(), no_env).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn load_empty_url_returns_invalid() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("reposync.yaml");
    file.write_str("repository:\n  url: \"\"\n").expect("write");

    let err = loader::load_with_env(file.path(), no_env).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
    assert!(err.to_string().contains("repository.url"));
}

// ---------------------------------------------------------------------------
// 2. Resolution
// ---------------------------------------------------------------------------

#[test]
fn relative_local_path_and_log_file_resolve_next_to_config() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("reposync.yaml");
    file.write_str(
        "repository:\n  url: https://github.com/octo/widgets\n  local_path: checkout\nlogging:\n  file: logs/reposync.log\n",
    )
    .expect("write");

    let config = loader::load_with_env(file.path(), no_env).expect("load");
    assert_eq!(config.repository.local_path, dir.path().join("checkout"));
    assert_eq!(config.logging.file, Some(dir.path().join("logs/reposync.log")));
}

#[test]
fn empty_log_file_means_console_only() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("reposync.yaml");
    file.write_str("repository:\n  url: https://github.com/octo/widgets\nlogging:\n  file: \"\"\n")
        .expect("write");

    let config = loader::load_with_env(file.path(), no_env).expect("load");
    assert_eq!(config.logging.file, None);
}

#[test]
fn absolute_local_path_is_kept() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("reposync.yaml");
    file.write_str("repository:\n  url: https://github.com/octo/widgets\n  local_path: /srv/widgets\n")
        .expect("write");

    let config = loader::load_with_env(file.path(), no_env).expect("load");
    assert_eq!(config.repository.local_path, PathBuf::from("/srv/widgets"));
}

// ---------------------------------------------------------------------------
// 3. Template
// ---------------------------------------------------------------------------

#[test]
fn template_loads_with_placeholders() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("reposync.yaml");
    loader::write_template_at(&path).expect("write template");

    dir.child("reposync.yaml").assert(predicate::str::contains("your_repository"));

    let config = loader::load_with_env(&path, no_env).expect("template loads");
    assert_eq!(config.repository.branch, "main");
    assert_eq!(config.repository.local_path, dir.path().join("checkout"));
    assert_eq!(config.logging.level, LogLevel::Info);
    let log_file = config.logging.file.clone().expect("template sets a log file");
    assert_eq!(log_file, dir.path().join("reposync.log"));
    assert!(
        !log_file.starts_with(&config.repository.local_path)
            && !path.starts_with(&config.repository.local_path),
        "config and log file must live outside the checkout"
    );
    assert_eq!(config.sync_config(false).token, None);
}

#[test]
fn template_refuses_to_overwrite() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("reposync.yaml");
    file.write_str("repository:\n  url: https://github.com/octo/widgets\n")
        .expect("write");

    let err = loader::write_template_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::AlreadyExists { .. }), "got: {err}");
    file.assert(predicate::str::contains("octo/widgets"));
}

#[test]
fn template_creates_missing_parent_dirs() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("etc").join("reposync").join("reposync.yaml");
    loader::write_template_at(&path).expect("write template");
    dir.child("etc/reposync/reposync.yaml").assert(predicate::path::exists());
}

#[test]
fn template_written_with_owner_only_permissions() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("reposync.yaml");
    loader::write_template_at(&path).expect("write template");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&path).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "expected 0600, got {mode:o}");
    }
    #[cfg(not(unix))]
    assert!(fs::metadata(&path).is_ok());
}
