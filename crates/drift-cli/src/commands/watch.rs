//! Watch command implementation

use std::sync::Arc;

use drift_core::DriftConfig;
use tokio::time::MissedTickBehavior;

use crate::commands::scan::{build_cycle, print_summary};
use crate::error::Result;
use crate::trigger::{CycleGate, CycleState};

/// Run cycles every `interval` until Ctrl-C
pub async fn run_watch(config: DriftConfig, json: bool) -> Result<()> {
    let cycle = Arc::new(build_cycle(&config)?);
    let repositories = Arc::new(config.repositories.clone());
    let gate = CycleGate::new();

    let mut ticker = tokio::time::interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(interval_secs = config.interval_secs, "Watching repositories");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(guard) = gate.try_begin() else {
                    tracing::warn!("Previous scan cycle still running, skipping this one");
                    continue;
                };
                let cycle = Arc::clone(&cycle);
                let repositories = Arc::clone(&repositories);
                tokio::spawn(async move {
                    let _guard = guard;
                    let summary = cycle.run(&repositories).await;
                    if let Err(e) = print_summary(&summary, json) {
                        tracing::error!(error = %e, "Failed to print scan summary");
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watch");
                break;
            }
        }
    }

    if gate.state() == CycleState::Running {
        tracing::warn!("A scan cycle was still running at shutdown");
    }
    Ok(())
}
