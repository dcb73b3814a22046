//! Source that copies repositories already present on disk

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use drift_fs::{NormalizedPath, io};

use crate::source::{RepositorySource, ensure_disjoint, repository_folder};
use crate::{Error, Result};

/// Serves repositories from a local mirror directory.
///
/// `fetch("github.com/acme/infra", dest)` copies `<root>/infra` into
/// `<dest>/infra`. The `.git` directory is not copied; the scanner only
/// needs the working tree.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    /// Create a source rooted at a directory containing one folder per repository.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RepositorySource for LocalSource {
    fn fetch(&self, repo: &str, dest_root: &Path) -> Result<NormalizedPath> {
        let folder = repository_folder(repo)?;
        let source = self.root.join(&folder);
        if !source.is_dir() {
            return Err(Error::SourceNotFound {
                repo: repo.to_string(),
                root: self.root.clone(),
            });
        }

        let dest = NormalizedPath::new(dest_root).join(&folder);
        ensure_disjoint(repo, &source, &dest.to_native())?;
        io::remove_tree(&dest)?;
        tracing::debug!(repository = %repo, source = %source.display(), dest = %dest, "Copying repository");

        if let Err(e) = copy_tree(&source, &dest.to_native()) {
            let _ = io::remove_tree(&dest);
            return Err(e);
        }
        Ok(dest)
    }
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    let walker = WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| Error::CopyFailed {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| source.to_path_buf()),
            message: e.to_string(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::CopyFailed {
                path: entry.path().to_path_buf(),
                message: e.to_string(),
            })?;
        let target = dest.join(relative);

        let copied = if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
        } else {
            fs::copy(entry.path(), &target).map(|_| ())
        };
        copied.map_err(|e| Error::Fs(drift_fs::Error::io(&target, e)))?;
    }
    Ok(())
}
