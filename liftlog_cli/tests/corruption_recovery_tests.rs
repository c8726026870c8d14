//! Corruption tests for the liftlog store.
//!
//! A corrupt stored collection must stop the command before anything is
//! written back over it.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("liftlog"));
    cmd.env("LIFTLOG_CONFIG", dir.join("config/liftlog/config.toml"))
        .env("RUST_LOG", "warn")
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn corrupt(dir: &Path, key: &str) -> std::path::PathBuf {
    let data_dir = dir.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    let path = data_dir.join(format!("{}.json", key));
    fs::write(&path, "{ invalid json }}}}").expect("Failed to write corrupted state");
    path
}

#[test]
fn test_corrupt_exercise_logs_abort_import() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let corrupted = corrupt(dir, "exerciseLogs");

    let file = dir.join("rows.json");
    fs::write(&file, r#"[{"exercise":"Plank","reps":1,"date":"2024-01-01"}]"#).unwrap();

    cli(dir)
        .arg("import")
        .arg(&file)
        .arg("--yes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("exerciseLogs"));

    assert_eq!(
        fs::read_to_string(&corrupted).unwrap(),
        "{ invalid json }}}}"
    );
    assert!(!dir.join("data/importedExercises.json").exists());
}

#[test]
fn test_corrupt_weight_log_blocks_new_entry() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let corrupted = corrupt(dir, "weightLogs_alice");

    cli(dir)
        .args(["--user", "alice", "weight", "add", "80"])
        .assert()
        .failure();

    assert_eq!(
        fs::read_to_string(&corrupted).unwrap(),
        "{ invalid json }}}}"
    );
}

#[test]
fn test_empty_store_file_reads_as_empty() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let data_dir = dir.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("exerciseLogs.json"), "").unwrap();

    cli(dir)
        .args(["log", "add", "plank", "--set", "1"])
        .assert()
        .success();

    let contents = fs::read_to_string(data_dir.join("exerciseLogs.json")).unwrap();
    assert!(contents.contains("plank"));
}

#[test]
fn test_leftover_temp_files_are_ignored() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let data_dir = dir.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join(".tmpABC123"), "partial write").unwrap();

    cli(dir)
        .args(["--user", "alice", "weight", "add", "80"])
        .assert()
        .success();

    cli(dir)
        .args(["--user", "alice", "weight", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("80"));
}
