//! Tests for materializing repositories through the git and local sources

use std::time::Duration;

use drift_git::{Error, GitSource, LocalSource, RepositorySource};
use drift_test_utils::git::repo_with_units;
use drift_test_utils::UnitTree;
use tempfile::TempDir;

#[test]
fn test_git_source_clones_local_repository() {
    let upstream = TempDir::new().unwrap();
    let upstream_path = upstream.path().join("infra");
    repo_with_units(&upstream_path, &["prod/app1", "dev/app2"]);

    let work = TempDir::new().unwrap();
    let source = GitSource::new();
    let local = source
        .fetch(upstream_path.to_str().unwrap(), work.path())
        .unwrap();

    assert_eq!(local.file_name(), Some("infra"));
    assert!(local.join("prod/app1/terragrunt.hcl").is_file());
    assert!(local.join("dev/app2/terragrunt.hcl").is_file());
}

#[test]
fn test_git_source_replaces_stale_copy() {
    let upstream = TempDir::new().unwrap();
    let upstream_path = upstream.path().join("infra");
    repo_with_units(&upstream_path, &["prod/app1"]);

    let work = TempDir::new().unwrap();
    let stale = work.path().join("infra/leftover");
    std::fs::create_dir_all(&stale).unwrap();

    let local = GitSource::new()
        .fetch(upstream_path.to_str().unwrap(), work.path())
        .unwrap();

    assert!(!local.join("leftover").exists());
    assert!(local.join("prod/app1").is_dir());
}

#[test]
fn test_git_source_missing_repository_fails_without_leftovers() {
    let missing = TempDir::new().unwrap();
    let repo = missing.path().join("does-not-exist");

    let work = TempDir::new().unwrap();
    let result = GitSource::new()
        .with_retry_budget(Duration::ZERO)
        .fetch(repo.to_str().unwrap(), work.path());

    assert!(matches!(result, Err(Error::CloneFailed { .. })));
    assert!(!work.path().join("does-not-exist").exists());
}

#[test]
fn test_git_source_refuses_to_clone_over_its_source() {
    let parent = TempDir::new().unwrap();
    let upstream_path = parent.path().join("infra");
    repo_with_units(&upstream_path, &["prod/app1"]);

    let result = GitSource::new()
        .with_retry_budget(Duration::ZERO)
        .fetch(upstream_path.to_str().unwrap(), parent.path());

    assert!(matches!(result, Err(Error::OverlappingDestination { .. })));
    assert!(upstream_path.join("prod/app1/terragrunt.hcl").is_file());
    assert!(upstream_path.join(".git").is_dir());
}

#[test]
fn test_git_source_refuses_destination_inside_source() {
    let upstream = TempDir::new().unwrap();
    let upstream_path = upstream.path().join("infra");
    repo_with_units(&upstream_path, &["prod/app1"]);

    let result = GitSource::new().fetch(
        upstream_path.to_str().unwrap(),
        &upstream_path.join(".drift/work"),
    );

    assert!(matches!(result, Err(Error::OverlappingDestination { .. })));
    assert!(upstream_path.join("prod/app1/terragrunt.hcl").is_file());
}

#[test]
fn test_local_source_refuses_its_own_root() {
    let mirror = UnitTree::new("infra");
    mirror.add_unit("prod/app1");

    let result = LocalSource::new(mirror.work_dir()).fetch("github.com/acme/infra", mirror.work_dir());

    assert!(matches!(result, Err(Error::OverlappingDestination { .. })));
    assert!(mirror.work_dir().join("infra/prod/app1/terragrunt.hcl").is_file());
}

#[test]
fn test_local_source_copies_working_tree() {
    let mirror = UnitTree::new("infra");
    mirror.add_unit("prod/app1");
    mirror.write_file(".git/HEAD", "ref: refs/heads/main\n");

    let work = TempDir::new().unwrap();
    let source = LocalSource::new(mirror.work_dir());
    let local = source.fetch("github.com/acme/infra", work.path()).unwrap();

    assert!(local.join("prod/app1/terragrunt.hcl").is_file());
    assert!(!local.join(".git").exists());
}

#[test]
fn test_local_source_unknown_repository() {
    let mirror = UnitTree::new("infra");
    let work = TempDir::new().unwrap();

    let result = LocalSource::new(mirror.work_dir()).fetch("github.com/acme/other", work.path());

    match result {
        Err(Error::SourceNotFound { repo, .. }) => assert_eq!(repo, "github.com/acme/other"),
        other => panic!("expected SourceNotFound, got {:?}", other),
    }
}
