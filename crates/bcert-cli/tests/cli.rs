//! End-to-end tests for the `bcert` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with an isolated config file and no credentials from the environment.
fn bcert(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bcert").unwrap();
    cmd.env_remove("BCERT_CREDENTIALS")
        .arg("--config")
        .arg(config);
    cmd
}

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();
    (dir, config)
}

fn credentials(dir: &Path) -> PathBuf {
    let path = dir.join("credentials.json");
    fs::write(&path, r#"{"api_key": "test-key"}"#).unwrap();
    path
}

#[test]
fn test_batch_empty_folder_prints_empty_table_and_chart() {
    let (dir, config) = workspace();
    let scans = dir.path().join("scans");
    fs::create_dir(&scans).unwrap();

    bcert(&config)
        .arg("batch")
        .arg(&scans)
        .assert()
        .success()
        .stdout(predicate::str::contains("Name  Date of Birth  Place of Birth"))
        .stdout(predicate::str::contains("(no rows)"))
        .stdout(predicate::str::contains("Births per Year"))
        .stdout(predicate::str::contains("(no data)"));
}

#[test]
fn test_batch_empty_folder_as_csv() {
    let (dir, config) = workspace();
    let scans = dir.path().join("scans");
    fs::create_dir(&scans).unwrap();

    bcert(&config)
        .args(["batch", "--format", "csv", "--no-chart"])
        .arg(&scans)
        .assert()
        .success()
        .stdout("Name,Date of Birth,Place of Birth\n");
}

#[test]
fn test_batch_missing_folder_fails() {
    let (dir, config) = workspace();

    bcert(&config)
        .arg("batch")
        .arg(dir.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_batch_without_credentials_fails() {
    let (dir, config) = workspace();
    let scans = dir.path().join("scans");
    fs::create_dir(&scans).unwrap();
    fs::write(scans.join("cert.jpg"), b"not really a jpeg").unwrap();

    bcert(&config)
        .arg("batch")
        .arg(&scans)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no credentials file configured"));
}

#[test]
fn test_batch_lenient_lists_unreachable_service_failures() {
    let (dir, config) = workspace();
    let creds = credentials(dir.path());
    let scans = dir.path().join("scans");
    fs::create_dir(&scans).unwrap();
    fs::write(scans.join("cert.jpg"), b"not really a jpeg").unwrap();

    bcert(&config)
        .arg("batch")
        .arg(&scans)
        .arg("--credentials")
        .arg(&creds)
        .args(["--endpoint", "http://127.0.0.1:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no rows)"))
        .stderr(predicate::str::contains("Failed documents:"))
        .stderr(predicate::str::contains("cert.jpg"));
}

#[test]
fn test_batch_strict_aborts_without_table() {
    let (dir, config) = workspace();
    let creds = credentials(dir.path());
    let scans = dir.path().join("scans");
    fs::create_dir(&scans).unwrap();
    fs::write(scans.join("cert.jpg"), b"not really a jpeg").unwrap();

    bcert(&config)
        .arg("batch")
        .arg(&scans)
        .arg("--strict")
        .arg("--credentials")
        .arg(&creds)
        .args(["--endpoint", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Name").not())
        .stderr(predicate::str::contains("cert.jpg"));
}

#[test]
fn test_report_charts_years_from_csv() {
    let (dir, config) = workspace();
    let table = dir.path().join("table.csv");
    fs::write(
        &table,
        "Name,Date of Birth,Place of Birth\n\
         Jane Doe,1990-05-01,Springfield\n\
         John Roe,\"March 3, 1985\",Shelbyville\n\
         Ann Poe,12/24/1990,Capital City\n",
    )
    .unwrap();

    bcert(&config)
        .arg("report")
        .arg(&table)
        .args(["--chart-width", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1985  ██ 1"))
        .stdout(predicate::str::contains("1990  ████ 2"));
}

#[test]
fn test_report_rejects_empty_date() {
    let (dir, config) = workspace();
    let table = dir.path().join("table.csv");
    fs::write(
        &table,
        "Name,Date of Birth,Place of Birth\nJane Doe,,Springfield\n",
    )
    .unwrap();

    bcert(&config)
        .arg("report")
        .arg(&table)
        .assert()
        .failure()
        .stderr(predicate::str::contains("date of birth is empty"));
}

#[test]
fn test_config_init_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.json");

    Command::cargo_bin("bcert")
        .unwrap()
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.exists());

    bcert(&config)
        .args(["config", "get", "pdf.dpi"])
        .assert()
        .success()
        .stdout("200\n");

    bcert(&config)
        .args(["config", "set", "pdf.dpi", "300"])
        .assert()
        .success();

    bcert(&config)
        .args(["config", "get", "pdf.dpi"])
        .assert()
        .success()
        .stdout("300\n");
}
