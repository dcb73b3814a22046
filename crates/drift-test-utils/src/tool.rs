//! A scriptable stand-in for the planning tool.
//!
//! [`FakePlanTool`] installs a small shell script that behaves like
//! `terragrunt plan`: it creates the cache directory, prints canned output
//! and exits with a chosen status. Each unit controls the script through a
//! [`PlanScript`] written into the unit directory.

use std::fs;
use std::path::{Path, PathBuf};

use drift_fs::UnitMarker;
use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
mkdir -p .terragrunt-cache 2>/dev/null
printf '%s' "$AWS_PROFILE" > .plan-profile
printf '%s' "$*" > .plan-args
if [ -f .plan-sleep ]; then sleep "$(cat .plan-sleep)"; fi
if [ -f .plan-output ]; then cat .plan-output; fi
if [ -f .plan-stderr ]; then cat .plan-stderr >&2; fi
if [ -f .plan-exit ]; then exit "$(cat .plan-exit)"; fi
exit 0
"#;

/// Installed fake planning tool.
pub struct FakePlanTool {
    _dir: TempDir,
    program: PathBuf,
}

impl Default for FakePlanTool {
    fn default() -> Self {
        Self::install()
    }
}

impl FakePlanTool {
    /// Write the script to a temporary directory and make it executable.
    ///
    /// # Panics
    /// Panics if the script cannot be written.
    pub fn install() -> Self {
        let dir = TempDir::new().unwrap();
        let program = dir.path().join("fake-terragrunt");
        fs::write(&program, SCRIPT)
            .unwrap_or_else(|e| panic!("FakePlanTool::install: failed to write script: {e}"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&program, fs::Permissions::from_mode(0o755))
                .unwrap_or_else(|e| panic!("FakePlanTool::install: chmod failed: {e}"));
        }

        Self { _dir: dir, program }
    }

    /// Path to the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The profile the tool saw in `AWS_PROFILE` when it last ran in `unit_dir`.
    pub fn seen_profile(unit_dir: &Path) -> Option<String> {
        fs::read_to_string(unit_dir.join(".plan-profile")).ok()
    }

    /// The arguments the tool received when it last ran in `unit_dir`.
    pub fn seen_args(unit_dir: &Path) -> Option<String> {
        fs::read_to_string(unit_dir.join(".plan-args")).ok()
    }

    /// Whether the tool has run in `unit_dir`.
    pub fn has_run(unit_dir: &Path) -> bool {
        unit_dir.join(".plan-args").exists()
    }
}

/// Canned behaviour for one unit.
#[derive(Debug, Clone, Default)]
pub struct PlanScript {
    stdout: String,
    stderr: String,
    exit_code: i32,
    sleep_secs: Option<f64>,
    block_cache: bool,
}

impl PlanScript {
    /// Print `stdout` and exit 0.
    pub fn output(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            ..Self::default()
        }
    }

    /// Plan reporting pending changes.
    pub fn drifted() -> Self {
        Self::output(crate::DRIFTED_OUTPUT)
    }

    /// Plan reporting no changes.
    pub fn fresh() -> Self {
        Self::output(crate::FRESH_OUTPUT)
    }

    /// Plan printing a configuration error but exiting 0.
    pub fn reported_error() -> Self {
        Self::output(crate::ERROR_OUTPUT)
    }

    /// Write to stderr as well.
    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }

    /// Exit with `code`.
    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Sleep before printing anything.
    pub fn sleep(mut self, secs: f64) -> Self {
        self.sleep_secs = Some(secs);
        self
    }

    /// Occupy the cache path with a regular file so cache cleanup fails.
    pub fn block_cache_cleanup(mut self) -> Self {
        self.block_cache = true;
        self
    }

    /// Write the control files into `unit_dir`.
    pub fn write_to(&self, unit_dir: &Path) {
        let write = |name: &str, content: &str| {
            fs::write(unit_dir.join(name), content)
                .unwrap_or_else(|e| panic!("PlanScript::write_to: failed to write {name}: {e}"));
        };

        write(".plan-output", &self.stdout);
        if !self.stderr.is_empty() {
            write(".plan-stderr", &self.stderr);
        }
        if self.exit_code != 0 {
            write(".plan-exit", &self.exit_code.to_string());
        }
        if let Some(secs) = self.sleep_secs {
            write(".plan-sleep", &secs.to_string());
        }
        if self.block_cache {
            write(UnitMarker::CacheDir.as_str(), "not a directory");
        }
    }
}
