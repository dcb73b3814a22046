//! Git-backed repository source

use std::path::Path;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use git2::build::RepoBuilder;
use git2::{Cred, ErrorClass, FetchOptions, RemoteCallbacks, Repository};

use drift_fs::{NormalizedPath, io};

use crate::source::{RepositorySource, ensure_disjoint, repository_folder};
use crate::{Error, Result};

/// Username sent alongside an installation access token.
///
/// Git hosts ignore it for token auth but reject an empty one.
const TOKEN_USERNAME: &str = "x-access-token";

/// Clones repositories with git2.
///
/// Identifiers without a scheme (`github.com/acme/infra`) are cloned over
/// HTTPS; URLs and local paths are passed through unchanged. Transient
/// network failures are retried with exponential backoff.
#[derive(Debug, Clone, Default)]
pub struct GitSource {
    token: Option<String>,
    max_elapsed: Option<Duration>,
}

impl GitSource {
    /// Create a source that clones anonymously.
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate with an access token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Bound the total time spent retrying a clone.
    pub fn with_retry_budget(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// Resolve a repository identifier into a clone URL.
    ///
    /// Existing local paths are made absolute.
    pub fn clone_url(repo: &str) -> String {
        if let Ok(local) = dunce::canonicalize(repo) {
            return local.to_string_lossy().into_owned();
        }
        let looks_local = repo.starts_with('/') || repo.starts_with('.');
        if repo.contains("://") || repo.contains('@') || looks_local {
            repo.to_string()
        } else {
            format!("https://{}.git", repo.trim_end_matches('/'))
        }
    }

    fn clone_once(&self, url: &str, dest: &Path) -> std::result::Result<Repository, git2::Error> {
        let mut callbacks = RemoteCallbacks::new();
        if let Some(token) = &self.token {
            let token = token.clone();
            callbacks.credentials(move |_url, _username, _allowed| {
                Cred::userpass_plaintext(TOKEN_USERNAME, &token)
            });
        }

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, dest)
    }
}

/// Whether a clone failure is worth retrying.
fn is_transient(err: &git2::Error) -> bool {
    matches!(
        err.class(),
        ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssl
    )
}

impl RepositorySource for GitSource {
    fn fetch(&self, repo: &str, dest_root: &Path) -> Result<NormalizedPath> {
        let folder = repository_folder(repo)?;
        let dest = NormalizedPath::new(dest_root).join(&folder);
        let url = Self::clone_url(repo);
        if Path::new(&url).exists() {
            ensure_disjoint(repo, Path::new(&url), &dest.to_native())?;
        }

        // A previous cycle that crashed mid-scan may have left a copy behind
        io::remove_tree(&dest)?;

        tracing::info!(repository = %repo, url = %url, dest = %dest, "Cloning repository");

        let mut policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .build();
        policy.max_elapsed_time = Some(self.max_elapsed.unwrap_or(Duration::from_secs(60)));

        let cloned = backoff::retry(policy, || {
            self.clone_once(&url, &dest.to_native()).map_err(|e| {
                if is_transient(&e) {
                    tracing::warn!(repository = %repo, error = %e, "Clone failed, retrying");
                    // A half-written checkout would make the next attempt fail
                    let _ = io::remove_tree(&dest);
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        });

        let repository = match cloned {
            Ok(repository) => repository,
            Err(backoff::Error::Permanent(e)) | Err(backoff::Error::Transient { err: e, .. }) => {
                let _ = io::remove_tree(&dest);
                return Err(Error::CloneFailed {
                    repo: repo.to_string(),
                    message: e.message().to_string(),
                });
            }
        };

        // Verify the checkout is usable before handing it to the scanner
        if let Err(e) = repository.head() {
            let _ = io::remove_tree(&dest);
            return Err(Error::CloneFailed {
                repo: repo.to_string(),
                message: format!("Cloned repository has no HEAD: {}", e.message()),
            });
        }

        Ok(dest)
    }
}
