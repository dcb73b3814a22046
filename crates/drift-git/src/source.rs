//! Repository source trait

use std::path::{Path, PathBuf};

use drift_fs::NormalizedPath;

use crate::{Error, Result};

/// Something that can materialize a repository's working tree locally.
///
/// Implementations must return only once the checkout is complete. The
/// caller owns the returned directory and removes it after scanning.
pub trait RepositorySource: Send + Sync {
    /// Materialize `repo` as a directory named after [`repository_folder`]
    /// inside `dest_root` and return its path.
    fn fetch(&self, repo: &str, dest_root: &Path) -> Result<NormalizedPath>;
}

/// Derive the local folder name for a repository identifier.
///
/// `github.com/acme/infra`, `https://github.com/acme/infra.git` and
/// `/srv/git/infra` all map to `infra`. The folder name becomes the first
/// segment of every unit path, which keeps report namespaces of different
/// repositories disjoint.
pub fn repository_folder(repo: &str) -> Result<String> {
    let trimmed = repo.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::InvalidRepository {
            repo: repo.to_string(),
        });
    }
    Ok(name.to_string())
}

/// Fail when `dest` is `origin`, or one of them contains the other.
///
/// Sources wipe `dest` before materializing into it, which must never reach
/// the tree being fetched from.
pub(crate) fn ensure_disjoint(repo: &str, origin: &Path, dest: &Path) -> Result<()> {
    let origin = resolve(origin);
    let dest = resolve(dest);
    if origin.starts_with(&dest) || dest.starts_with(&origin) {
        return Err(Error::OverlappingDestination {
            repo: repo.to_string(),
            origin,
            dest,
        });
    }
    Ok(())
}

/// Canonical form of `path`, resolved through its nearest existing ancestor
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = dunce::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => resolve(parent).join(name),
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}
