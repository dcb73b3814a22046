//! Error types for drift-git

use std::path::PathBuf;

/// Result type for drift-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while materializing a repository
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] drift_fs::Error),

    #[error("Invalid repository identifier: '{repo}'")]
    InvalidRepository { repo: String },

    #[error("Failed to clone '{repo}': {message}")]
    CloneFailed { repo: String, message: String },

    #[error("Repository '{repo}' not found under {root}")]
    SourceNotFound { repo: String, root: PathBuf },

    #[error("Refusing to fetch '{repo}' into {dest}: it overlaps the source at {origin}")]
    OverlappingDestination {
        repo: String,
        origin: PathBuf,
        dest: PathBuf,
    },

    #[error("Failed to copy {path}: {message}")]
    CopyFailed { path: PathBuf, message: String },
}
