use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const HEADER: &str = "datetime,amount,merchant_category,expense_type\n";

fn write_csv(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("upi.csv");
    std::fs::write(&path, body).unwrap();
    path
}

fn sample_csv(dir: &Path) -> PathBuf {
    write_csv(
        dir,
        &format!(
            "{HEADER}2024-05-01 09:10:00,1500,Rent,essential\n\
             2024-05-02 13:00:00,250.50,Dining,non-essential\n\
             2024-05-03 18:45:00,800,Groceries,essential\n\
             2024-05-04 21:30:00,120,Dining,non-essential\n"
        ),
    )
}

/// Binary isolated from the user's config, credentials and any .env file.
fn cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("upi-advisor").unwrap();
    cmd.current_dir(dir)
        .env("UPI_ADVISOR_CONFIG_DIR", dir.join("config"))
        .env("NO_COLOR", "1")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GEMINI_MODEL")
        .env_remove("GEMINI_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// A localhost URL whose port was just released, so nothing is listening.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[test]
fn summary_prints_digest() {
    let dir = tempfile::tempdir().unwrap();
    let csv = sample_csv(dir.path());
    cmd(dir.path())
        .args(["summary", csv.to_str().unwrap(), "--income", "40000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total spend: ₹2,670.50"))
        .stdout(predicate::str::contains("Essential spend: ₹2,300.00"))
        .stdout(predicate::str::contains("Non-essential spend: ₹370.50"))
        .stdout(predicate::str::contains("- Rent: ₹1,500.00"))
        .stdout(predicate::str::contains("- Savings (20%): ₹8,000.00"));
}

#[test]
fn summary_respects_row_limit() {
    let dir = tempfile::tempdir().unwrap();
    let csv = sample_csv(dir.path());
    cmd(dir.path())
        .args(["summary", csv.to_str().unwrap(), "--rows", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions analysed: 2"))
        .stdout(predicate::str::contains("Total spend: ₹1,750.50"))
        .stdout(predicate::str::contains("Groceries").not());
}

#[test]
fn missing_columns_abort_with_names() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "datetime,merchant_category\n2024-01-01,Fuel\n");
    cmd(dir.path())
        .args(["summary", csv.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Total spend").not())
        .stderr(predicate::str::contains(
            "Missing columns in data: amount, expense_type",
        ));
}

#[test]
fn bad_row_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        dir.path(),
        &format!("{HEADER}2024-01-01,12,Fuel,essential\nnot-a-date,5,Fuel,essential\n"),
    );
    cmd(dir.path())
        .args(["summary", csv.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid row at line 3"));
}

#[test]
fn no_input_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .arg("summary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No transactions file given"));
}

#[test]
fn advise_without_credential_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let csv = sample_csv(dir.path());
    cmd(dir.path())
        .args(["advise", csv.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("GEMINI_API_KEY is not set"));
}

#[test]
fn advise_degrades_to_message_when_service_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let csv = sample_csv(dir.path());
    cmd(dir.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", closed_port_url())
        .args([
            "advise",
            csv.to_str().unwrap(),
            "--max-attempts",
            "1",
            "--backoff-secs",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total spend: ₹2,670.50"))
        .stdout(predicate::str::contains(
            "An error occurred while generating recommendations",
        ));
}

#[test]
fn preview_shows_first_rows() {
    let dir = tempfile::tempdir().unwrap();
    let csv = sample_csv(dir.path());
    cmd(dir.path())
        .args(["preview", csv.to_str().unwrap(), "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Data (1 of 4 rows)"))
        .stdout(predicate::str::contains("Rent"))
        .stdout(predicate::str::contains("Groceries").not());
}

#[test]
fn init_sets_default_file_used_by_summary() {
    let dir = tempfile::tempdir().unwrap();
    let csv = sample_csv(dir.path());
    cmd(dir.path())
        .args(["init", "--default-file", csv.to_str().unwrap(), "--summary-rows", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved settings"));

    cmd(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("upi.csv"))
        .stdout(predicate::str::contains("Summary rows:    1"))
        .stdout(predicate::str::contains("GEMINI_API_KEY:  missing"));

    cmd(dir.path())
        .arg("summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions analysed: 1"));
}

#[test]
fn init_rejects_zero_attempts() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path())
        .args(["init", "--max-attempts", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--max-attempts must be at least 1"));
}
