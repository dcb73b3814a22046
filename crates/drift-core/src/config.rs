//! Drift detector configuration
//!
//! Loaded from TOML, JSON or YAML through [`ConfigStore`]; every field has a
//! default so an empty file (or no file) is a valid configuration.
//!
//! ```toml
//! repositories = ["github.com/acme/infra"]
//! environments = ["prod", "dev"]
//! concurrency = 12
//!
//! [plan]
//! program = "terragrunt"
//! unmatched = "errored"
//! ```

use std::time::Duration;

use drift_fs::{ConfigStore, NormalizedPath, UnitMarker};
use serde::{Deserialize, Serialize};

use crate::classify::{Classifier, Markers, UnmatchedPolicy};
use crate::discovery::{Discoverer, EnvironmentAllowlist};
use crate::executor::PlanCommand;
use crate::scheduler::DEFAULT_CEILING;
use crate::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Repositories scanned each cycle
    pub repositories: Vec<String>,
    /// Environment allow-list
    pub environments: Vec<String>,
    /// Maximum plans running at once
    pub concurrency: usize,
    /// Per-unit deadline in seconds, `0` disables it
    pub timeout_secs: u64,
    /// Scratch directory repositories are fetched into. Everything under it
    /// is owned by the scanner and may be deleted.
    pub work_dir: NormalizedPath,
    /// Where CSV reports are written
    pub report_dir: NormalizedPath,
    /// Pause between cycles in watch mode
    pub interval_secs: u64,
    pub plan: PlanConfig,
    pub git: GitConfig,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            environments: vec!["prod".to_string(), "dev".to_string()],
            concurrency: DEFAULT_CEILING,
            timeout_secs: 30 * 60,
            work_dir: NormalizedPath::new(".drift/work"),
            report_dir: NormalizedPath::new("csv/data"),
            interval_secs: 24 * 60 * 60,
            plan: PlanConfig::default(),
            git: GitConfig::default(),
        }
    }
}

/// Planning tool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub program: String,
    pub args: Vec<String>,
    /// File that marks a directory as a unit
    pub descriptor: String,
    pub cache_dir: String,
    /// Variables set to the unit's environment
    pub profile_vars: Vec<String>,
    pub unmatched: UnmatchedPolicy,
    pub markers: Markers,
}

impl Default for PlanConfig {
    fn default() -> Self {
        let command = PlanCommand::default();
        Self {
            program: command.program,
            args: command.args,
            descriptor: UnitMarker::Descriptor.as_str().to_string(),
            cache_dir: command.cache_dir,
            profile_vars: command.profile_vars,
            unmatched: UnmatchedPolicy::default(),
            markers: Markers::default(),
        }
    }
}

/// Repository access settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Environment variable holding an access token
    pub token_env: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            token_env: "DRIFT_DETECTOR_GIT_TOKEN".to_string(),
        }
    }
}

impl DriftConfig {
    /// Load and validate a configuration file
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let config: DriftConfig = ConfigStore::new().load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the scanner cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(Error::Config {
                message: message.to_string(),
            })
        };

        if self.concurrency == 0 {
            return invalid("concurrency must be at least 1");
        }
        if self.interval_secs == 0 {
            return invalid("interval must be at least 1 second");
        }
        if self.environments.is_empty() {
            return invalid("at least one environment must be allowed");
        }
        if self.plan.program.trim().is_empty() {
            return invalid("plan program must not be empty");
        }
        if self.plan.descriptor.trim().is_empty() {
            return invalid("plan descriptor must not be empty");
        }
        let markers = &self.plan.markers;
        if markers.error.is_empty() || markers.drift.is_empty() || markers.fresh.is_empty() {
            return invalid("plan markers must not be empty");
        }
        Ok(())
    }

    /// Per-unit deadline, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn allowlist(&self) -> EnvironmentAllowlist {
        EnvironmentAllowlist::new(self.environments.iter().cloned())
    }

    pub fn discoverer(&self) -> Discoverer {
        Discoverer::new().with_descriptor(self.plan.descriptor.clone())
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new()
            .with_markers(self.plan.markers.clone())
            .with_unmatched(self.plan.unmatched)
    }

    pub fn plan_command(&self) -> PlanCommand {
        PlanCommand {
            program: self.plan.program.clone(),
            args: self.plan.args.clone(),
            profile_vars: self.plan.profile_vars.clone(),
            cache_dir: self.plan.cache_dir.clone(),
        }
    }

    /// Access token from the configured environment variable, if set
    pub fn git_token(&self) -> Option<String> {
        std::env::var(&self.git.token_env)
            .ok()
            .filter(|token| !token.is_empty())
    }
}
