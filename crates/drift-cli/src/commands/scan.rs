//! Scan command implementation

use std::sync::Arc;

use colored::Colorize;
use drift_core::{
    CsvSink, CycleSummary, DriftConfig, LogSink, PlanExecutor, RepositoryOutcome, ScanCycle,
    Scheduler, Sinks,
};
use drift_git::GitSource;

use crate::error::{CliError, Result};

/// Wire a scan cycle from configuration
pub fn build_cycle(config: &DriftConfig) -> Result<ScanCycle> {
    config.validate()?;
    if config.repositories.is_empty() {
        return Err(CliError::user(
            "No repositories configured. Pass --repo or set DRIFT_DETECTOR_ALLOWLIST.",
        ));
    }
    std::fs::create_dir_all(config.work_dir.to_native())?;

    let mut source = GitSource::new();
    if let Some(token) = config.git_token() {
        source = source.with_token(token);
    }

    let executor = PlanExecutor::new(config.work_dir.clone())
        .with_command(config.plan_command())
        .with_classifier(config.classifier())
        .with_timeout(config.timeout());
    let scheduler = Scheduler::new(Arc::new(executor)).with_ceiling(config.concurrency);
    let sinks = Sinks::new()
        .with(LogSink)
        .with(CsvSink::new(config.report_dir.clone()));

    Ok(ScanCycle::new(Arc::new(source), config.work_dir.clone(), scheduler)
        .with_discoverer(config.discoverer())
        .with_allowlist(config.allowlist())
        .with_sinks(sinks))
}

/// Run the scan command
pub async fn run_scan(config: DriftConfig, json: bool) -> Result<()> {
    let cycle = build_cycle(&config)?;
    let summary = cycle.run(&config.repositories).await;
    print_summary(&summary, json)
}

/// Print a per-repository table, or the whole summary as JSON
pub fn print_summary(summary: &CycleSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{} {}", "Scan".bold(), summary.scan_id.to_string().dimmed());
    println!();
    for outcome in &summary.repositories {
        match outcome {
            RepositoryOutcome::Scanned(set) => {
                let totals = set.totals();
                println!(
                    "  {} {}  {} drifted, {} errored, {} unchanged",
                    "+".green(),
                    set.repository.cyan(),
                    totals.drifted.to_string().yellow(),
                    totals.errored.to_string().red(),
                    totals.fresh.to_string().green()
                );
                for path in &set.drifted {
                    println!("      {} {}", "drifted".yellow(), path);
                }
                for path in &set.errored {
                    println!("      {} {}", "error".red(), path);
                }
            }
            RepositoryOutcome::Skipped { repository, reason } => {
                println!("  {} {}  skipped: {}", "x".red(), repository.cyan(), reason);
            }
        }
    }

    let totals = summary.totals();
    println!();
    println!(
        "{}: {} drifted, {} errored, {} unchanged ({} skipped)",
        "Total".bold(),
        totals.drifted,
        totals.errored,
        totals.fresh,
        summary.skipped()
    );
    Ok(())
}
