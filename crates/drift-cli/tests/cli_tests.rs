//! Tests for the drift binary.
//!
//! These tests exercise the compiled binary using assert_cmd, each from a
//! fresh temporary working directory.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use drift_test_utils::{FakePlanTool, UnitTree};
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the drift binary running in `dir`
fn drift_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("drift"));
    cmd.current_dir(dir)
        .env_remove("DRIFT_DETECTOR_ALLOWLIST")
        .env_remove("DRIFT_DETECTOR_CONFIG")
        .env_remove("DRIFT_DETECTOR_REPORT_DIR")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn test_help_output() {
    let temp = TempDir::new().unwrap();
    drift_cmd(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Drift detector"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("report"));
}

#[test]
fn test_completions_bash() {
    let temp = TempDir::new().unwrap();
    drift_cmd(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("drift"));
}

// ============================================================================
// Classify
// ============================================================================

#[test]
fn test_classify_saved_outputs() {
    let temp = TempDir::new().unwrap();
    let cases = [
        ("drifted.txt", drift_test_utils::DRIFTED_OUTPUT, "drifted"),
        ("fresh.txt", drift_test_utils::FRESH_OUTPUT, "No changes"),
        ("error.txt", drift_test_utils::ERROR_OUTPUT, "error"),
    ];

    for (name, content, expected) in cases {
        fs::write(temp.path().join(name), content).unwrap();
        drift_cmd(temp.path())
            .args(["classify", name])
            .assert()
            .success()
            .stdout(predicate::str::starts_with(expected));
    }
}

#[test]
fn test_classify_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    drift_cmd(temp.path())
        .args(["classify", "absent.txt"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_classify_honours_unmatched_policy_from_config() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("drift.toml"), "[plan]\nunmatched = \"errored\"\n").unwrap();
    fs::write(temp.path().join("odd.txt"), "Segmentation fault\n").unwrap();

    drift_cmd(temp.path())
        .args(["classify", "odd.txt"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("error"));
}

// ============================================================================
// Discover
// ============================================================================

#[test]
fn test_discover_lists_allowed_units() {
    let tree = UnitTree::new("team");
    tree.add_unit("prod/app1");
    tree.add_unit("staging/app2");

    drift_cmd(tree.work_dir())
        .args(["discover", "team"])
        .assert()
        .success()
        .stdout(predicate::str::contains("team/prod/app1"))
        .stdout(predicate::str::contains("team/staging/app2").not())
        .stdout(predicate::str::contains("1 of 2 units listed"));
}

#[test]
fn test_discover_all_includes_other_environments() {
    let tree = UnitTree::new("team");
    tree.add_unit("prod/app1");
    tree.add_unit("staging/app2");

    drift_cmd(tree.work_dir())
        .args(["discover", "team", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("team/staging/app2"))
        .stdout(predicate::str::contains("2 of 2 units listed"));
}

// ============================================================================
// Report
// ============================================================================

fn write_reports(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("infra_report.csv"),
        "infra/prod/app1,drifted\ninfra/dev/db,error\ninfra/dev/app2,No changes\n",
    )
    .unwrap();
    fs::write(dir.join("platform_report.csv"), "platform/prod/cluster,No changes\n").unwrap();
}

#[test]
fn test_report_renders_merged_tree() {
    let temp = TempDir::new().unwrap();
    write_reports(&temp.path().join("csv/data"));

    drift_cmd(temp.path())
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("reports\n"))
        .stdout(predicate::str::contains("app1 [drifted]"))
        .stdout(predicate::str::contains("cluster [No changes]"))
        .stdout(predicate::str::contains("Total"));
}

#[test]
fn test_report_json_totals() {
    let temp = TempDir::new().unwrap();
    write_reports(&temp.path().join("out"));

    let output = drift_cmd(temp.path())
        .args(["report", "--report-dir", "out", "--root", "all", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["root"]["name"], "all");
    assert_eq!(json["reports"], 2);
    assert_eq!(json["totals"]["drifted"], 1);
    assert_eq!(json["totals"]["errored"], 1);
    assert_eq!(json["totals"]["fresh"], 2);
}

// ============================================================================
// Scan
// ============================================================================

#[test]
fn test_scan_without_repositories_fails() {
    let temp = TempDir::new().unwrap();
    drift_cmd(temp.path())
        .arg("scan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No repositories configured"));
}

#[test]
fn test_scan_rejects_zero_concurrency() {
    let temp = TempDir::new().unwrap();
    drift_cmd(temp.path())
        .args(["scan", "--repo", "github.com/acme/infra", "--concurrency", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}

#[test]
fn test_scan_local_git_repository() {
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("origin/infra");
    drift_test_utils::git::repo_with_units(&origin, &["prod/app", "dev/db", "qa/skip"]);

    let tool = FakePlanTool::install();
    fs::write(
        temp.path().join("drift.toml"),
        format!(
            "work_dir = \"work\"\nreport_dir = \"reports\"\n\n[plan]\nprogram = \"{}\"\n",
            tool.program().display()
        ),
    )
    .unwrap();

    drift_cmd(temp.path())
        .args(["scan", "--repo", &origin.display().to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 drifted, 0 errored, 2 unchanged"));

    let csv = fs::read_to_string(temp.path().join("reports/infra_report.csv")).unwrap();
    assert_eq!(csv, "infra/dev/db,No changes\ninfra/prod/app,No changes\n");
    assert!(!temp.path().join("work/infra").exists());
}

#[test]
fn test_scan_sibling_repository_with_default_work_dir() {
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("infra");
    drift_test_utils::git::repo_with_units(&origin, &["prod/app"]);

    let tool = FakePlanTool::install();
    fs::write(
        temp.path().join("drift.toml"),
        format!("[plan]\nprogram = \"{}\"\n", tool.program().display()),
    )
    .unwrap();

    drift_cmd(temp.path())
        .args(["scan", "--repo", "./infra"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 drifted, 0 errored, 1 unchanged"));

    assert!(origin.join("prod/app/terragrunt.hcl").is_file());
    assert!(origin.join(".git").is_dir());
    assert!(!temp.path().join(".drift/work/infra").exists());
}

// ============================================================================
// Watch
// ============================================================================

#[test]
fn test_watch_rejects_zero_interval() {
    let temp = TempDir::new().unwrap();
    drift_cmd(temp.path())
        .args(["watch", "--repo", "github.com/acme/infra", "--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval must be at least 1 second"));
}
