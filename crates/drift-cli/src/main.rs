//! Drift detector CLI
//!
//! Scans infrastructure repositories for configuration drift and reports
//! the results.

mod cli;
mod commands;
mod error;
mod logging;
mod trigger;

use std::path::Path;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use drift_core::DriftConfig;
use drift_fs::NormalizedPath;

use cli::{Cli, Commands};
use error::Result;

/// Picked up from the working directory when `--config` is not given
const DEFAULT_CONFIG: &str = "drift.toml";

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    let mut config = load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Scan(args) => {
            args.apply(&mut config);
            runtime()?.block_on(commands::run_scan(config, args.json))
        }
        Commands::Watch { scan, interval } => {
            scan.apply(&mut config);
            if let Some(interval) = interval {
                config.interval_secs = interval;
            }
            config.validate()?;
            runtime()?.block_on(commands::run_watch(config, scan.json))
        }
        Commands::Report {
            report_dir,
            root,
            json,
        } => {
            let dir = report_dir.unwrap_or_else(|| config.report_dir.to_native());
            commands::run_report(&dir, &root, &config.allowlist(), json)
        }
        Commands::Discover { dir, all } => {
            commands::run_discover(&dir, &config.discoverer(), &config.allowlist(), all)
        }
        Commands::Classify { file } => commands::run_classify(&file, &config.classifier()),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "drift", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load the given config file, or `drift.toml` if present, or defaults
fn load_config(path: Option<&Path>) -> Result<DriftConfig> {
    let path = match path {
        Some(path) => NormalizedPath::new(path),
        None => {
            let fallback = NormalizedPath::new(DEFAULT_CONFIG);
            if !fallback.is_file() {
                return Ok(DriftConfig::default());
            }
            fallback
        }
    };
    Ok(DriftConfig::load(&path)?)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
