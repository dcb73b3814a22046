//! Running the planning tool against one unit

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use drift_fs::{NormalizedPath, UnitMarker, io};
use tokio::process::Command;

use crate::classify::{Classifier, Outcome};
use crate::verdict::ScanUnit;
use crate::{Error, Result};

/// Default per-unit deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Produces a verdict for a single unit.
///
/// Implementations must not fail: anything that goes wrong becomes an
/// `Errored` outcome.
#[async_trait]
pub trait UnitExecutor: Send + Sync {
    async fn execute(&self, unit: &ScanUnit) -> Outcome;
}

/// How to invoke the planning tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Variables set to the unit's environment name before spawning
    pub profile_vars: Vec<String>,
    /// Cache directory the tool leaves behind in the unit
    pub cache_dir: String,
}

impl Default for PlanCommand {
    fn default() -> Self {
        Self {
            program: "terragrunt".to_string(),
            args: vec![
                "plan".to_string(),
                "-lock=false".to_string(),
                format!("-out={}", UnitMarker::PlanFile),
            ],
            profile_vars: vec!["AWS_PROFILE".to_string(), "TF_VAR_aws_profile".to_string()],
            cache_dir: UnitMarker::CacheDir.as_str().to_string(),
        }
    }
}

/// Runs [`PlanCommand`] in each unit directory and classifies its output
#[derive(Debug, Clone)]
pub struct PlanExecutor {
    scan_root: NormalizedPath,
    command: PlanCommand,
    classifier: Classifier,
    timeout: Option<Duration>,
}

impl PlanExecutor {
    /// Create an executor resolving unit paths against `scan_root`
    pub fn new(scan_root: impl Into<NormalizedPath>) -> Self {
        Self {
            scan_root: scan_root.into(),
            command: PlanCommand::default(),
            classifier: Classifier::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_command(mut self, command: PlanCommand) -> Self {
        self.command = command;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the per-unit deadline; `None` waits forever
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn scan_root(&self) -> &NormalizedPath {
        &self.scan_root
    }

    /// Spawn the tool and return its combined stdout and stderr.
    async fn run_plan(&self, unit: &ScanUnit, unit_dir: &NormalizedPath) -> Result<Vec<u8>> {
        let mut command = Command::new(&self.command.program);
        command
            .args(&self.command.args)
            .current_dir(unit_dir.to_native())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        for var in &self.command.profile_vars {
            command.env(var, &unit.environment);
        }

        tracing::debug!(
            unit = %unit.path,
            program = %self.command.program,
            environment = %unit.environment,
            "Running plan"
        );

        let running = command.output();
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, running).await {
                Ok(output) => output,
                Err(_) => {
                    return Err(Error::PlanTimedOut {
                        unit: unit.path.to_string(),
                        timeout: limit,
                    });
                }
            },
            None => running.await,
        };

        let output = output.map_err(|e| Error::PlanFailed {
            unit: unit.path.to_string(),
            message: format!("failed to run {}: {}", self.command.program, e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().rev().find(|line| !line.trim().is_empty());
            return Err(Error::PlanFailed {
                unit: unit.path.to_string(),
                message: match detail {
                    Some(line) => format!("{} ({})", output.status, line.trim()),
                    None => output.status.to_string(),
                },
            });
        }

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        Ok(combined)
    }

    /// Remove the tool's cache directory; failures are only logged.
    async fn cleanup(&self, unit: &ScanUnit, unit_dir: &NormalizedPath) {
        let cache = unit_dir.join(&self.command.cache_dir);
        let removal = tokio::task::spawn_blocking(move || io::remove_tree(&cache)).await;
        match removal {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(unit = %unit.path, error = %e, "Failed to remove plan cache");
            }
            Err(e) => {
                tracing::warn!(unit = %unit.path, error = %e, "Plan cache cleanup task failed");
            }
        }
    }
}

#[async_trait]
impl UnitExecutor for PlanExecutor {
    async fn execute(&self, unit: &ScanUnit) -> Outcome {
        let unit_dir = self.scan_root.join(unit.path.as_str());

        let outcome = match self.run_plan(unit, &unit_dir).await {
            Ok(output) => self.classifier.classify(&output, unit.path.as_str()),
            Err(e) => {
                tracing::info!(unit = %unit.path, error = %e, "Plan did not complete");
                Outcome::errored(e)
            }
        };

        self.cleanup(unit, &unit_dir).await;
        outcome
    }
}
