//! End-to-end tests for the scan flow
//!
//! These tests exercise the complete path: fetch -> discover -> plan ->
//! classify -> CSV report -> aggregated tree.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use drift_core::export;
use drift_core::{
    CsvSink, EnvironmentAllowlist, PlanCommand, PlanExecutor, RepositoryOutcome, ScanCycle,
    ScanVerdict, Scheduler, Sinks,
};
use drift_git::{GitSource, LocalSource, RepositorySource};
use drift_test_utils::{FakePlanTool, PlanScript};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Work, report and mirror directories for one test
struct Workspace {
    tool: FakePlanTool,
    mirror: TempDir,
    work: TempDir,
    reports: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            tool: FakePlanTool::install(),
            mirror: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
            reports: TempDir::new().unwrap(),
        }
    }

    /// Create `<mirror>/<relative>` as a unit that behaves like `script`
    fn unit(&self, relative: &str, script: PlanScript) {
        let dir = self.mirror.path().join(relative);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("terragrunt.hcl"), "terraform {}\n").unwrap();
        script.write_to(&dir);
    }

    fn cycle(&self, source: Arc<dyn RepositorySource>, timeout: Option<Duration>) -> ScanCycle {
        let executor = PlanExecutor::new(self.work.path())
            .with_command(PlanCommand {
                program: self.tool.program().to_string_lossy().into_owned(),
                ..PlanCommand::default()
            })
            .with_timeout(timeout);
        ScanCycle::new(
            source,
            self.work.path(),
            Scheduler::new(Arc::new(executor)).with_ceiling(3),
        )
        .with_sinks(Sinks::new().with(CsvSink::new(self.reports.path())))
    }

    fn local_cycle(&self) -> ScanCycle {
        self.cycle(Arc::new(LocalSource::new(self.mirror.path())), None)
    }

    fn is_work_dir_empty(&self) -> bool {
        fs::read_dir(self.work.path()).unwrap().next().is_none()
    }
}

fn repos(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_repositories_aggregate_into_one_tree() {
    let ws = Workspace::new();
    ws.unit("infra/prod/app1", PlanScript::drifted());
    ws.unit("infra/prod/app2", PlanScript::fresh());
    ws.unit("infra/dev/app1", PlanScript::reported_error());
    ws.unit("infra/staging/app1", PlanScript::drifted());
    ws.unit("platform/prod/cluster", PlanScript::fresh());
    ws.unit("platform/dev/cluster", PlanScript::drifted().exit_code(1));

    let summary = ws
        .local_cycle()
        .run(&repos(&["github.com/acme/infra", "github.com/acme/platform"]))
        .await;

    assert_eq!(summary.skipped(), 0);
    assert!(ws.is_work_dir_empty());

    let merged = export::aggregate(ws.reports.path(), "reports", &EnvironmentAllowlist::default()).unwrap();
    assert_eq!(merged.reports, 2);
    assert_eq!(merged.totals, summary.totals());
    assert_eq!(merged.root.children.keys().collect::<Vec<_>>(), vec!["infra", "platform"]);
    assert!(merged.root.get("infra/staging").is_none());

    let scanned: BTreeSet<_> = summary.scanned().flat_map(|set| set.results()).collect();
    let aggregated: BTreeSet<_> = merged.root.flatten().into_iter().collect();
    assert_eq!(aggregated, scanned);
    assert_eq!(
        merged.root.get("platform/dev/cluster").and_then(|n| n.status),
        Some(ScanVerdict::Errored)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_admitted_unit_gets_exactly_one_verdict() {
    let ws = Workspace::new();
    let scripts = [
        PlanScript::drifted(),
        PlanScript::fresh(),
        PlanScript::reported_error(),
        PlanScript::output("unexpected"),
        PlanScript::fresh().exit_code(3),
        PlanScript::drifted().sleep(20.0),
    ];
    for (i, script) in scripts.into_iter().enumerate() {
        let env = if i % 2 == 0 { "prod" } else { "dev" };
        ws.unit(&format!("infra/{env}/unit{i}"), script);
    }

    let cycle = ws.cycle(
        Arc::new(LocalSource::new(ws.mirror.path())),
        Some(Duration::from_millis(800)),
    );
    let summary = cycle.run(&repos(&["infra"])).await;

    let RepositoryOutcome::Scanned(set) = &summary.repositories[0] else {
        panic!("infra should have been scanned: {:?}", summary.repositories[0]);
    };
    assert_eq!(set.len(), 6);
    let totals = set.totals();
    assert_eq!(totals.drifted, 1);
    // reported error, non-zero exit, timeout
    assert_eq!(totals.errored, 3);
    assert_eq!(totals.fresh, 2);
}

#[tokio::test]
async fn git_source_cycle_clones_scans_and_cleans_up() {
    let ws = Workspace::new();
    let origin = ws.mirror.path().join("infra");
    drift_test_utils::git::repo_with_units(&origin, &["prod/app", "dev/db", "qa/skip"]);

    let source = GitSource::new().with_retry_budget(Duration::ZERO);
    let summary = ws
        .cycle(Arc::new(source), None)
        .run(&[origin.display().to_string()])
        .await;

    let RepositoryOutcome::Scanned(set) = &summary.repositories[0] else {
        panic!("clone should have succeeded: {:?}", summary.repositories[0]);
    };
    let fresh: Vec<_> = set.fresh.iter().map(|p| p.as_str()).collect();
    assert_eq!(fresh, vec!["infra/dev/db", "infra/prod/app"]);
    assert!(ws.is_work_dir_empty());
    assert!(ws.reports.path().join("infra_report.csv").is_file());
}

#[tokio::test]
async fn rescan_replaces_previous_report() {
    let ws = Workspace::new();
    ws.unit("infra/prod/app", PlanScript::drifted());
    let cycle = ws.local_cycle();

    cycle.run(&repos(&["infra"])).await;
    PlanScript::fresh().write_to(&ws.mirror.path().join("infra/prod/app"));
    cycle.run(&repos(&["infra"])).await;

    let report = read(&ws.reports.path().join("infra_report.csv"));
    assert_eq!(report, "infra/prod/app,No changes\n");
}

#[tokio::test]
async fn unreachable_repository_leaves_no_report() {
    let ws = Workspace::new();
    ws.unit("infra/prod/app", PlanScript::fresh());

    let summary = ws.local_cycle().run(&repos(&["ghost", "infra"])).await;

    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.repositories[1].repository(), "infra");
    assert!(!ws.reports.path().join("ghost_report.csv").exists());
    assert!(ws.reports.path().join("infra_report.csv").exists());
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}
