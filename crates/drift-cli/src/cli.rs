//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use drift_core::DriftConfig;
use drift_fs::NormalizedPath;

/// Drift detector - find infrastructure units whose live state no longer matches their code
#[derive(Parser, Debug)]
#[command(name = "drift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "DRIFT_DETECTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run one scan cycle over the configured repositories
    ///
    /// Examples:
    ///   drift scan --repo github.com/acme/infra
    ///   drift scan --concurrency 4 --timeout 600
    Scan(ScanArgs),

    /// Run scan cycles periodically until interrupted
    ///
    /// A cycle is skipped when the previous one is still running.
    Watch {
        #[command(flatten)]
        scan: ScanArgs,

        /// Seconds between cycles
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Aggregate stored CSV reports into one tree
    Report {
        /// Directory holding `<repo>_report.csv` files
        #[arg(long, env = "DRIFT_DETECTOR_REPORT_DIR")]
        report_dir: Option<PathBuf>,

        /// Name of the aggregated root node
        #[arg(long, default_value = drift_core::export::DEFAULT_ROOT)]
        root: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List the units found under a local directory
    Discover {
        /// Repository directory to walk
        dir: PathBuf,

        /// Include units outside the allowed environments
        #[arg(long)]
        all: bool,
    },

    /// Classify saved plan output
    Classify {
        /// File holding the plan output
        file: PathBuf,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   drift completions bash > ~/.local/share/bash-completion/completions/drift
    ///   drift completions zsh > ~/.zfunc/_drift
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by `scan` and `watch`
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanArgs {
    /// Repository to scan (repeatable, or comma-separated)
    #[arg(short, long = "repo", env = "DRIFT_DETECTOR_ALLOWLIST", value_delimiter = ',')]
    pub repos: Vec<String>,

    /// Directory receiving CSV reports
    #[arg(long, env = "DRIFT_DETECTOR_REPORT_DIR")]
    pub report_dir: Option<PathBuf>,

    /// Directory repositories are fetched into
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Maximum plans running at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-unit deadline in seconds (0 disables it)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the cycle summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl ScanArgs {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut DriftConfig) {
        if !self.repos.is_empty() {
            config.repositories = self
                .repos
                .iter()
                .map(|repo| repo.trim().to_string())
                .filter(|repo| !repo.is_empty())
                .collect();
        }
        if let Some(dir) = &self.report_dir {
            config.report_dir = NormalizedPath::new(dir);
        }
        if let Some(dir) = &self.work_dir {
            config.work_dir = NormalizedPath::new(dir);
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
    }
}
