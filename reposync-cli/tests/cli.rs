use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use predicates::str::contains;

fn reposync_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("reposync"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(cwd: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(["-c", "user.name=Seed", "-c", "user.email=seed@example.com"])
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Bare repo at `<root>/remotes/octo/widgets.git` with one commit on `main`.
fn seeded_remote(root: &Path) -> PathBuf {
    let bare = root.join("remotes").join("octo").join("widgets.git");
    fs::create_dir_all(&bare).unwrap();
    git(&bare, &["init", "--bare", "--quiet"]);
    git(&bare, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    let seed = root.join("seed");
    fs::create_dir_all(&seed).unwrap();
    git(&seed, &["init", "--quiet"]);
    git(&seed, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    fs::write(seed.join("README.md"), "hello\n").unwrap();
    git(&seed, &["add", "README.md"]);
    git(&seed, &["commit", "--quiet", "-m", "initial"]);
    git(&seed, &["push", "--quiet", bare.to_str().unwrap(), "HEAD:main"]);
    bare
}

#[test]
fn init_config_writes_template_and_exits_zero() {
    let dir = TempDir::new().unwrap();

    reposync_cmd(dir.path())
        .args(["--init-config", "--config", "conf/reposync.yaml"])
        .assert()
        .success()
        .stdout(contains("Wrote config template"));

    dir.child("conf/reposync.yaml")
        .assert(predicate::path::is_file())
        .assert(contains("repository:"))
        .assert(contains("auto_stash: true"));
}

#[test]
fn init_config_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    dir.child("reposync.yaml").write_str("repository:\n  url: mine\n").unwrap();

    reposync_cmd(dir.path())
        .arg("--init-config")
        .assert()
        .code(1)
        .stderr(contains("already exists"));

    dir.child("reposync.yaml").assert("repository:\n  url: mine\n");
}

#[test]
fn missing_config_writes_template_and_fails() {
    let dir = TempDir::new().unwrap();

    reposync_cmd(dir.path())
        .assert()
        .code(1)
        .stderr(contains("not found").and(contains("Edit it and run again")));

    dir.child("reposync.yaml")
        .assert(contains("your_username/your_repository"));
}

#[test]
fn invalid_config_fails_with_context() {
    let dir = TempDir::new().unwrap();
    dir.child("reposync.yaml")
        .write_str("repository:\n  url: https://github.com/octo/widgets.git\n  colour: blue\n")
        .unwrap();

    reposync_cmd(dir.path())
        .assert()
        .code(1)
        .stderr(contains("failed to load config"));
}

#[test]
fn dry_run_on_fresh_path_plans_clone_and_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let remote = dir.path().join("octo").join("widgets.git");
    dir.child("reposync.yaml")
        .write_str(&format!(
            "repository:\n  url: {}\n  local_path: checkout\nhosting:\n  api_url: http://127.0.0.1:9\n",
            remote.display()
        ))
        .unwrap();

    reposync_cmd(dir.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(
            contains("[dry-run]")
                .and(contains(format!("git clone --branch main {} .", remote.display())))
                .and(contains("git pull origin main")),
        );

    dir.child("checkout").assert(predicate::path::missing());
}

#[test]
fn malformed_url_exits_one() {
    let dir = TempDir::new().unwrap();
    dir.child("reposync.yaml")
        .write_str("repository:\n  url: https://github.com/widgets\n  local_path: checkout\n")
        .unwrap();

    reposync_cmd(dir.path())
        .assert()
        .code(1)
        .stderr(contains("invalid repository URL"));

    dir.child("checkout").assert(predicate::path::missing());
}

#[test]
fn log_file_receives_plain_output() {
    let dir = TempDir::new().unwrap();
    let remote = dir.path().join("octo").join("widgets.git");
    dir.child("reposync.yaml")
        .write_str(&format!(
            "repository:\n  url: {}\n  local_path: checkout\nlogging:\n  file: logs/run.log\n",
            remote.display()
        ))
        .unwrap();

    reposync_cmd(dir.path()).args(["-n", "-v"]).assert().success();

    let log = fs::read_to_string(dir.path().join("logs/run.log")).unwrap();
    assert!(log.contains("starting repository synchronization"), "got: {log}");
    assert!(log.contains("DEBUG") || log.contains("INFO"), "got: {log}");
    assert!(!log.contains('\u{1b}'));
}

#[test]
fn template_layout_syncs_from_its_own_directory() {
    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let remote = seeded_remote(dir.path());
    let deploy = dir.child("deploy");
    deploy.create_dir_all().unwrap();

    reposync_cmd(deploy.path()).arg("--init-config").assert().success();
    let config = deploy.path().join("reposync.yaml");
    let edited = fs::read_to_string(&config).unwrap().replace(
        "https://github.com/your_username/your_repository.git",
        &remote.display().to_string(),
    );
    fs::write(&config, edited).unwrap();

    for _ in 0..2 {
        reposync_cmd(deploy.path())
            .assert()
            .success()
            .stdout(contains("already up to date"));
    }

    deploy.child("checkout/README.md").assert("hello\n");
    deploy.child("reposync.log").assert(predicate::path::is_file());
}

#[cfg(unix)]
#[test]
fn sigint_mid_clone_exits_130() {
    use std::io::Read;
    use std::net::TcpListener;
    use std::process::Stdio;
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    if !git_available() {
        eprintln!("git not found; skipping");
        return;
    }
    let dir = TempDir::new().unwrap();

    // Accepts the clone's connection and never answers, so the clone hangs.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (connected_tx, connected_rx) = mpsc::channel();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            let _ = connected_tx.send(());
            thread::sleep(Duration::from_secs(60));
            drop(stream);
        }
    });
    dir.child("reposync.yaml")
        .write_str(&format!(
            "repository:\n  url: http://127.0.0.1:{port}/octo/widgets.git\n"
        ))
        .unwrap();

    let mut child = reposync_cmd(dir.path())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    connected_rx
        .recv_timeout(Duration::from_secs(30))
        .expect("clone never reached the server");

    let kill = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(kill.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("reposync kept running after SIGINT");
        }
        thread::sleep(Duration::from_millis(50));
    };

    let mut stderr = String::new();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();
    assert_eq!(status.code(), Some(130), "stderr: {stderr}");
    assert!(stderr.contains("operation cancelled by user"), "stderr: {stderr}");
}
