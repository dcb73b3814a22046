//! Git repository fixtures holding unit trees.

use std::fs;
use std::path::Path;

use git2::{Repository, Signature};

/// Initialise a git repository at `path`, commit every file currently in the
/// directory and return the repository.
///
/// Use for: tests that clone the repository through a real git source.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_all(path: &Path, message: &str) -> Repository {
    let repo = Repository::open(path)
        .or_else(|_| Repository::init(path))
        .unwrap_or_else(|e| panic!("commit_all: failed to open {}: {e}", path.display()));

    {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap_or_else(|e| panic!("commit_all: failed to stage files: {e}"));
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test User", "test@test.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap_or_else(|e| panic!("commit_all: commit failed: {e}"));
    }

    repo
}

/// Initialise a repository at `path` containing one unit per entry of
/// `units` (relative paths), committed on the default branch.
///
/// # Panics
/// Panics if the filesystem or git operations fail.
pub fn repo_with_units(path: &Path, units: &[&str]) -> Repository {
    fs::create_dir_all(path).unwrap();
    fs::write(path.join("README.md"), "# infra\n").unwrap();
    for unit in units {
        let dir = path.join(unit);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(drift_fs::UnitMarker::Descriptor.as_str()),
            "terraform {}\n",
        )
        .unwrap();
    }
    commit_all(path, "Initial commit")
}
