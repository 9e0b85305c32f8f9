//! End-to-end tests driving the `hours` binary against a scratch repository.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, UNIX_EPOCH};

use tempfile::TempDir;

const T: u64 = 1_700_000_000;

fn hours_binary() -> String {
    env!("CARGO_BIN_EXE_hours").to_string()
}

/// Builds a command isolated from the user's config and environment.
fn hours(home: &Path, repo: &Path) -> Command {
    let mut cmd = Command::new(hours_binary());
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("HOURS_POLL_INTERVAL_SECS")
        .env_remove("HOURS_STATE_FILE")
        .env_remove("HOURS_IGNORE_FILE")
        .arg("--root")
        .arg(repo);
    cmd
}

fn touch(path: &Path, mtime: u64) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = File::options()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(mtime))
        .unwrap();
}

fn run_ok(cmd: &mut Command) -> String {
    let output: Output = cmd.output().expect("failed to run hours");
    assert!(
        output.status.success(),
        "hours should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn read_state(repo: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(repo.join("hours.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_scan_records_baseline_then_work() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    touch(&repo.path().join("src/main.rs"), T);
    touch(&repo.path().join(".git/HEAD"), T);

    run_ok(hours(home.path(), repo.path()).arg("scan"));
    let state = read_state(repo.path());
    assert_eq!(state["./src/main.rs"]["LastModified"], T);
    assert_eq!(state["./src/main.rs"]["TotalWorked"], 0);
    assert!(state.get("./.git/HEAD").is_none());
    assert!(state.get("./hours.json").is_none());
    assert!(state.get("./hours.lock").is_none());

    touch(&repo.path().join("src/main.rs"), T + 30);
    let stdout = run_ok(hours(home.path(), repo.path()).arg("scan"));
    assert!(
        stdout.contains("You have spent 0 hours, 0 minutes, 30 seconds working on this repo"),
        "unexpected output: {stdout}"
    );

    let state = read_state(repo.path());
    assert_eq!(state["."]["TotalWorked"], 30);
    assert_eq!(state["./src"]["TotalWorked"], 30);
}

#[test]
fn test_idle_gap_is_clamped() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    let file = repo.path().join("notes.txt");
    touch(&file, T);

    run_ok(hours(home.path(), repo.path()).arg("scan"));
    touch(&file, T + 900);
    run_ok(hours(home.path(), repo.path()).arg("scan"));

    let state = read_state(repo.path());
    assert_eq!(state["./notes.txt"]["TotalWorked"], 60);
    assert_eq!(state["./notes.txt"]["LastModified"], T + 900);
}

#[test]
fn test_ignore_file_is_honoured() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    std::fs::write(
        repo.path().join(".hoursignore.json"),
        r#"[{"Pattern": "./keep.log", "IsNeg": true}, {"Pattern": "./*.log", "IsNeg": false}]"#,
    )
    .unwrap();
    touch(&repo.path().join("build.log"), T);
    touch(&repo.path().join("keep.log"), T);

    run_ok(hours(home.path(), repo.path()).arg("scan"));

    let state = read_state(repo.path());
    assert!(state.get("./build.log").is_none());
    assert!(state.get("./keep.log").is_some());
}

#[test]
fn test_status_and_dump_before_any_scan() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();

    let stdout = run_ok(hours(home.path(), repo.path()).arg("status"));
    assert_eq!(stdout, "No time has been recorded for this repository yet.\n");

    let stdout = run_ok(hours(home.path(), repo.path()).arg("dump"));
    assert_eq!(stdout, "{}\n");
}

#[test]
fn test_corrupt_state_starts_fresh() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    std::fs::write(repo.path().join("hours.json"), "{broken").unwrap();
    touch(&repo.path().join("a.rs"), T);

    run_ok(hours(home.path(), repo.path()).arg("scan"));

    let state = read_state(repo.path());
    assert_eq!(state["./a.rs"]["TotalWorked"], 0);
}

#[test]
fn test_config_file_moves_state_file() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    let config = home.path().join("hours.toml");
    std::fs::write(&config, "state_file = \"tracked.json\"\n").unwrap();
    touch(&repo.path().join("a.rs"), T);

    run_ok(
        hours(home.path(), repo.path())
            .arg("--config")
            .arg(&config)
            .arg("scan"),
    );

    assert!(repo.path().join("tracked.json").exists());
    assert!(!repo.path().join("hours.json").exists());
    let content = std::fs::read_to_string(repo.path().join("tracked.json")).unwrap();
    let state: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert!(state.get("./tracked.json").is_none());
}

#[test]
fn test_watch_menu_prints_time_and_exits() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    let file = repo.path().join("lib.rs");
    touch(&file, T);
    run_ok(hours(home.path(), repo.path()).arg("scan"));
    touch(&file, T + 45);
    run_ok(hours(home.path(), repo.path()).arg("scan"));

    let mut child = hours(home.path(), repo.path())
        .env("HOURS_POLL_INTERVAL_SECS", "3600")
        .arg("watch")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"2\n1\n0\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(
        output.status.success(),
        "watch should exit cleanly: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("You have spent 0 hours, 0 minutes, 45 seconds working on this repo"));
    assert!(stdout.contains("\"./lib.rs\""));
    assert_eq!(stdout.matches("Choose an option").count(), 3);
}
