use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const ADVICE: &str = "KRUNGTHAI BANK\nDEBIT ADVICE\nA/C NO : 9943-000613-001\n\
                      Date : 02-Dec-2025\nOur Ref: IC 25/0662\n\
                      Total Debited : USD 87,300.06\n";

fn cashflow(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cashflow").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, extra: &str) {
    let json = format!(
        r#"{{"db_path": "ledger.db", "master_path": "Master/AC_Master.xlsx"{extra}}}"#
    );
    std::fs::write(dir.join("config.json"), json).unwrap();
}

#[test]
fn extract_prints_json_entries() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "");
    std::fs::write(dir.path().join("advice.txt"), ADVICE).unwrap();

    cashflow(dir.path())
        .args(["extract", "advice.txt", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9943-000613-001"))
        .stdout(predicate::str::contains("\"DEBIT\""))
        .stdout(predicate::str::contains("2025-12-02"));
}

#[test]
fn extract_save_then_list_records() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "");
    std::fs::write(dir.path().join("advice.txt"), ADVICE).unwrap();

    cashflow(dir.path())
        .args(["extract", "advice.txt", "--save"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 saved"));

    cashflow(dir.path())
        .args(["extract", "advice.txt", "--save"])
        .assert()
        .success()
        .stderr(predicate::str::contains("already saved"));

    cashflow(dir.path())
        .args(["records", "list", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("A/C No,Bank Name"))
        .stdout(predicate::str::contains("9943-000613-001,Krungthai"))
        .stdout(predicate::str::contains("87300.06"));
}

#[test]
fn records_list_on_empty_database() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "");

    cashflow(dir.path())
        .args(["records", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No records found."));
}

#[test]
fn check_names_missing_tool() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        r#", "tesseract_cmd": "/nonexistent/tesseract", "pdftoppm_cmd": "/nonexistent/pdftoppm""#,
    );

    cashflow(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Required tool not found"))
        .stderr(predicate::str::contains("tesseract"));
}

#[test]
fn process_rejects_missing_source_folder() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "");

    cashflow(dir.path())
        .args(["process", "--all", "--source", "no-such-folder"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source folder not found"));
}

#[test]
fn malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ nope").unwrap();

    cashflow(dir.path())
        .args(["records", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.json"));
}

#[test]
fn init_creates_config_and_database() {
    let dir = tempfile::tempdir().unwrap();

    cashflow(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("(created)"));

    assert!(dir.path().join("config.json").is_file());
    assert!(dir.path().join("ocr_data.db").is_file());
    assert!(dir.path().join("output").is_dir());
}
