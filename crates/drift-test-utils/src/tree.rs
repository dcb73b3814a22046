//! [`UnitTree`] builder for repository working trees.

use std::fs;
use std::path::{Path, PathBuf};

use drift_fs::UnitMarker;
use tempfile::TempDir;

/// A temporary directory laid out like a checked-out infrastructure
/// repository.
///
/// # Example
///
/// ```rust,no_run
/// use drift_test_utils::UnitTree;
///
/// let tree = UnitTree::new("team");
/// tree.add_unit("prod/app1");
/// tree.add_unit("staging/app2");
/// assert!(tree.repo_root().join("prod/app1/terragrunt.hcl").exists());
/// ```
pub struct UnitTree {
    temp_dir: TempDir,
    repo: String,
}

impl UnitTree {
    /// Create a temporary work directory containing an empty repository
    /// folder named `repo`.
    pub fn new(repo: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(repo))
            .unwrap_or_else(|e| panic!("UnitTree::new: failed to create {repo}: {e}"));
        Self {
            temp_dir,
            repo: repo.to_string(),
        }
    }

    /// The work directory (parent of the repository folder).
    pub fn work_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The repository folder.
    pub fn repo_root(&self) -> PathBuf {
        self.temp_dir.path().join(&self.repo)
    }

    /// The repository folder name.
    pub fn repo_name(&self) -> &str {
        &self.repo
    }

    /// Create a unit directory (with descriptor) at `relative` inside the
    /// repository and return its absolute path.
    pub fn add_unit(&self, relative: &str) -> PathBuf {
        let dir = self.add_dir(relative);
        fs::write(
            dir.join(UnitMarker::Descriptor.as_str()),
            "include \"root\" {\n  path = find_in_parent_folders()\n}\n",
        )
        .unwrap_or_else(|e| panic!("UnitTree::add_unit: failed to write descriptor: {e}"));
        dir
    }

    /// Create a plain directory at `relative` inside the repository.
    pub fn add_dir(&self, relative: &str) -> PathBuf {
        let dir = self.repo_root().join(relative);
        fs::create_dir_all(&dir)
            .unwrap_or_else(|e| panic!("UnitTree::add_dir: failed to create {}: {e}", dir.display()));
        dir
    }

    /// Write a file at `relative` inside the repository.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.repo_root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("UnitTree::write_file: failed to write {}: {e}", path.display()));
        path
    }
}
