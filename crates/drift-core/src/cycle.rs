//! One scan pass over every configured repository
//!
//! For each repository the cycle fetches a fresh copy into the work
//! directory, discovers and filters its units, schedules the plans,
//! publishes the results and finally removes the copy. A repository that
//! cannot be fetched or walked is skipped; the others still run.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use drift_fs::{NormalizedPath, io};
use drift_git::RepositorySource;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::discovery::{Discoverer, EnvironmentAllowlist};
use crate::scheduler::Scheduler;
use crate::sink::Sinks;
use crate::verdict::{ScanResultSet, Totals};
use crate::{Error, Result};

/// Identifier shared by every report of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(Uuid);

impl ScanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened to one repository during a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepositoryOutcome {
    Scanned(ScanResultSet),
    Skipped { repository: String, reason: String },
}

impl RepositoryOutcome {
    pub fn repository(&self) -> &str {
        match self {
            RepositoryOutcome::Scanned(set) => &set.repository,
            RepositoryOutcome::Skipped { repository, .. } => repository,
        }
    }
}

/// Result of [`ScanCycle::run`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub scan_id: ScanId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub repositories: Vec<RepositoryOutcome>,
}

impl CycleSummary {
    /// Result sets of the repositories that were scanned
    pub fn scanned(&self) -> impl Iterator<Item = &ScanResultSet> {
        self.repositories.iter().filter_map(|outcome| match outcome {
            RepositoryOutcome::Scanned(set) => Some(set),
            RepositoryOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> usize {
        self.repositories.len() - self.scanned().count()
    }

    /// Verdict counts over every scanned repository
    pub fn totals(&self) -> Totals {
        self.scanned().fold(Totals::default(), |acc, set| acc + set.totals())
    }
}

/// Drives fetch, discovery, scheduling and publishing for a list of
/// repositories
pub struct ScanCycle {
    source: Arc<dyn RepositorySource>,
    work_dir: NormalizedPath,
    discoverer: Discoverer,
    allowlist: EnvironmentAllowlist,
    scheduler: Scheduler,
    sinks: Sinks,
}

impl ScanCycle {
    /// `work_dir` must be the directory the scheduler's executor resolves
    /// unit paths against.
    pub fn new(
        source: Arc<dyn RepositorySource>,
        work_dir: impl Into<NormalizedPath>,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            source,
            work_dir: work_dir.into(),
            discoverer: Discoverer::default(),
            allowlist: EnvironmentAllowlist::default(),
            scheduler,
            sinks: Sinks::default(),
        }
    }

    pub fn with_discoverer(mut self, discoverer: Discoverer) -> Self {
        self.discoverer = discoverer;
        self
    }

    pub fn with_allowlist(mut self, allowlist: EnvironmentAllowlist) -> Self {
        self.allowlist = allowlist;
        self
    }

    pub fn with_sinks(mut self, sinks: Sinks) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn allowlist(&self) -> &EnvironmentAllowlist {
        &self.allowlist
    }

    /// Scan every repository in order.
    pub async fn run(&self, repositories: &[String]) -> CycleSummary {
        let scan_id = ScanId::new();
        let started_at = Utc::now();
        tracing::info!(scan_id = %scan_id, repositories = repositories.len(), "Scan cycle started");

        let mut outcomes = Vec::with_capacity(repositories.len());
        for repository in repositories {
            let span = tracing::info_span!("repository", repository = %repository);
            let outcome = self.scan_repository(&scan_id, repository).instrument(span).await;
            outcomes.push(outcome);
        }

        let summary = CycleSummary {
            scan_id,
            started_at,
            finished_at: Utc::now(),
            repositories: outcomes,
        };
        let totals = summary.totals();
        tracing::info!(
            scan_id = %scan_id,
            skipped = summary.skipped(),
            drifted = totals.drifted,
            errored = totals.errored,
            fresh = totals.fresh,
            "Scan cycle finished"
        );
        summary
    }

    async fn scan_repository(&self, scan_id: &ScanId, repository: &str) -> RepositoryOutcome {
        let skipped = |error: Error| {
            tracing::error!(repository = %repository, error = %error, "Skipping repository");
            RepositoryOutcome::Skipped {
                repository: repository.to_string(),
                reason: error.to_string(),
            }
        };

        let local = match self.fetch(repository).await {
            Ok(local) => local,
            Err(e) => return skipped(e),
        };

        let scanned = self.scan_checkout(repository, &local).await;

        let copy = local.clone();
        match tokio::task::spawn_blocking(move || io::remove_tree(&copy)).await {
            Ok(Ok(())) => tracing::debug!(path = %local, "Removed local copy"),
            Ok(Err(e)) => tracing::warn!(path = %local, error = %e, "Failed to remove local copy"),
            Err(e) => tracing::warn!(path = %local, error = %e, "Local copy removal task failed"),
        }

        match scanned {
            Ok(results) => {
                self.sinks.publish_all(scan_id, &results);
                RepositoryOutcome::Scanned(results)
            }
            Err(e) => skipped(e),
        }
    }

    async fn fetch(&self, repository: &str) -> Result<NormalizedPath> {
        let source = Arc::clone(&self.source);
        let repo = repository.to_string();
        let dest_root: PathBuf = self.work_dir.to_native();
        let local = tokio::task::spawn_blocking(move || source.fetch(&repo, &dest_root)).await??;
        tracing::info!(repository = %repository, path = %local, "Repository fetched");
        Ok(local)
    }

    async fn scan_checkout(&self, repository: &str, local: &NormalizedPath) -> Result<ScanResultSet> {
        let discoverer = self.discoverer.clone();
        let root = local.to_native();
        let paths = tokio::task::spawn_blocking(move || discoverer.discover(&root)).await??;

        let units = self.allowlist.filter_units(paths);
        tracing::info!(repository = %repository, units = units.len(), "Units admitted");

        Ok(self.scheduler.scan_all(repository, units).await)
    }
}
