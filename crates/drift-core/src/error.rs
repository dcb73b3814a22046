//! Error types for drift-core

use std::path::PathBuf;
use std::time::Duration;

/// Result type for drift-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in drift-core operations
///
/// Only repository-level setup failures (`Fetch`, `Discovery`) ever abort
/// work; per-unit errors are carried inside an [`Outcome`](crate::Outcome)
/// next to an `Errored` verdict.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Repository source could not materialize the repository
    #[error("Fetch failed: {0}")]
    Fetch(#[from] drift_git::Error),

    /// Filesystem error from drift-fs
    #[error(transparent)]
    Fs(#[from] drift_fs::Error),

    /// Walking the repository tree failed
    #[error("Discovery failed under {root}: {message}")]
    Discovery { root: PathBuf, message: String },

    /// The planning tool could not be run or exited non-zero
    #[error("Plan failed for {unit}: {message}")]
    PlanFailed { unit: String, message: String },

    /// The planning tool did not finish before the deadline
    #[error("Plan for {unit} did not finish within {timeout:?}")]
    PlanTimedOut { unit: String, timeout: Duration },

    /// The plan output carried the tool's error marker
    #[error("Plan reported an error for {unit}")]
    PlanReportedError { unit: String },

    /// The plan output matched none of the known markers
    #[error("Plan output for {unit} matched no known marker")]
    UnclassifiedOutput { unit: String },

    /// A stored report could not be interpreted
    #[error("Invalid report {path}: {message}")]
    Report { path: PathBuf, message: String },

    /// Configuration failed validation
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// CSV encoding or decoding error
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
