//! Tests for PlanExecutor against a scripted planning tool

use std::time::Duration;

use drift_core::{Classifier, Error, PlanCommand, PlanExecutor, ScanUnit, ScanVerdict, UnitExecutor, UnmatchedPolicy};
use drift_test_utils::{FakePlanTool, PlanScript, UnitTree};

fn executor(tool: &FakePlanTool, tree: &UnitTree) -> PlanExecutor {
    PlanExecutor::new(tree.work_dir()).with_command(PlanCommand {
        program: tool.program().to_string_lossy().into_owned(),
        ..PlanCommand::default()
    })
}

fn unit(tree: &UnitTree, relative: &str, script: PlanScript) -> ScanUnit {
    let dir = tree.add_unit(relative);
    script.write_to(&dir);
    let path = format!("{}/{}", tree.repo_name(), relative);
    let environment = relative.split('/').next().unwrap().to_string();
    ScanUnit::new(path, environment)
}

#[tokio::test]
async fn test_drift_marker_yields_drifted() {
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let unit = unit(&tree, "prod/app", PlanScript::drifted());

    let outcome = executor(&tool, &tree).execute(&unit).await;

    assert_eq!(outcome.verdict, ScanVerdict::Drifted);
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn test_fresh_marker_yields_fresh() {
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let unit = unit(&tree, "dev/app", PlanScript::fresh());

    let outcome = executor(&tool, &tree).execute(&unit).await;

    assert_eq!(outcome.verdict, ScanVerdict::Fresh);
}

#[tokio::test]
async fn test_reported_error_with_zero_exit_is_errored() {
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let unit = unit(&tree, "prod/app", PlanScript::reported_error());

    let outcome = executor(&tool, &tree).execute(&unit).await;

    assert_eq!(outcome.verdict, ScanVerdict::Errored);
    assert!(matches!(outcome.error, Some(Error::PlanReportedError { .. })));
}

#[tokio::test]
async fn test_stderr_is_part_of_the_output() {
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let script = PlanScript::output("").with_stderr(drift_test_utils::ERROR_OUTPUT);
    let unit = unit(&tree, "prod/app", script);

    let outcome = executor(&tool, &tree).execute(&unit).await;

    assert_eq!(outcome.verdict, ScanVerdict::Errored);
}

#[tokio::test]
async fn test_non_zero_exit_skips_classification() {
    // Drift marker in the output must not matter once the tool has failed
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let unit = unit(&tree, "prod/app", PlanScript::drifted().exit_code(1));

    let outcome = executor(&tool, &tree).execute(&unit).await;

    assert_eq!(outcome.verdict, ScanVerdict::Errored);
    assert!(matches!(outcome.error, Some(Error::PlanFailed { .. })));
}

#[tokio::test]
async fn test_unmatched_output_follows_policy() {
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let unit = unit(&tree, "prod/app", PlanScript::output("nothing useful\n"));

    let lenient = executor(&tool, &tree).execute(&unit).await;
    let strict = executor(&tool, &tree)
        .with_classifier(Classifier::new().with_unmatched(UnmatchedPolicy::Errored))
        .execute(&unit)
        .await;

    assert_eq!(lenient.verdict, ScanVerdict::Fresh);
    assert_eq!(strict.verdict, ScanVerdict::Errored);
}

#[tokio::test]
async fn test_environment_selects_credentials_profile() {
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let unit = unit(&tree, "dev/app", PlanScript::fresh());

    executor(&tool, &tree).execute(&unit).await;

    let dir = tree.repo_root().join("dev/app");
    assert_eq!(FakePlanTool::seen_profile(&dir).as_deref(), Some("dev"));
    assert_eq!(
        FakePlanTool::seen_args(&dir).as_deref(),
        Some("plan -lock=false -out=tfplan.out")
    );
}

#[tokio::test]
async fn test_cache_directory_is_removed() {
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let unit = unit(&tree, "prod/app", PlanScript::drifted().exit_code(2));

    executor(&tool, &tree).execute(&unit).await;

    let dir = tree.repo_root().join("prod/app");
    assert!(FakePlanTool::has_run(&dir));
    assert!(!dir.join(".terragrunt-cache").exists());
}

#[tokio::test]
async fn test_cleanup_failure_keeps_verdict() {
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let unit = unit(&tree, "prod/app", PlanScript::drifted().block_cache_cleanup());

    let outcome = executor(&tool, &tree).execute(&unit).await;

    assert_eq!(outcome.verdict, ScanVerdict::Drifted);
    assert!(tree.repo_root().join("prod/app/.terragrunt-cache").is_file());
}

#[tokio::test]
async fn test_timeout_is_errored() {
    let tool = FakePlanTool::install();
    let tree = UnitTree::new("infra");
    let unit = unit(&tree, "prod/slow", PlanScript::drifted().sleep(10.0));

    let started = std::time::Instant::now();
    let outcome = executor(&tool, &tree)
        .with_timeout(Some(Duration::from_millis(300)))
        .execute(&unit)
        .await;

    assert_eq!(outcome.verdict, ScanVerdict::Errored);
    assert!(matches!(outcome.error, Some(Error::PlanTimedOut { .. })));
    assert!(started.elapsed() < Duration::from_secs(5));
}
