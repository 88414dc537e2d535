//! CLI argument-surface scenarios. No network: these only exercise clap
//! parsing and the paths that finish before any request is sent.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_all_subcommands() {
    let mut cmd = Command::cargo_bin("epicheck").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("day"))
        .stdout(predicate::str::contains("roster"))
        .stdout(predicate::str::contains("mark"))
        .stdout(predicate::str::contains("scan"));
}

#[test]
fn malformed_event_reference_is_rejected_at_parse_time() {
    let mut cmd = Command::cargo_bin("epicheck").unwrap();
    cmd.args(["roster", "2025/B-INN-000/PAR-0-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "year/module/instance/activity/occurrence",
        ));
}

#[test]
fn mark_requires_a_status() {
    let mut cmd = Command::cargo_bin("epicheck").unwrap();
    cmd.args([
        "mark",
        "2025/B-INN-000/PAR-0-1/acti-1/event-1",
        "marie.curie",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--status"));
}

#[test]
fn logout_clears_without_any_network() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("epicheck").unwrap();
    cmd.env("EPICHECK_TOKEN_FILE", dir.path().join("token"))
        // Nothing listens here; logout must never connect.
        .env("EPICHECK_BASE_URL", "http://127.0.0.1:9")
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("cached token removed"));
}

#[test]
fn malformed_date_is_rejected_at_parse_time() {
    let mut cmd = Command::cargo_bin("epicheck").unwrap();
    cmd.args(["day", "--date", "not-a-date"])
        .assert()
        .failure();
}
