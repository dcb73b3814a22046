//! Bounded fan-out of unit executions
//!
//! Every unit gets its own task, but a task only runs the executor while
//! holding a permit from the admission gate, so at most `ceiling` plans are
//! in flight at once. Results come back over a channel sized to the unit
//! count, and [`Scheduler::scan_all`] returns once every task has finished.

use std::collections::HashMap;
use std::sync::Arc;

use drift_fs::NormalizedPath;
use tokio::sync::{Semaphore, mpsc};

use crate::executor::UnitExecutor;
use crate::verdict::{ScanResult, ScanResultSet, ScanUnit, ScanVerdict};

/// Default number of plans allowed to run at once
pub const DEFAULT_CEILING: usize = 12;

/// Runs an executor over many units with bounded parallelism
#[derive(Clone)]
pub struct Scheduler {
    executor: Arc<dyn UnitExecutor>,
    ceiling: usize,
}

impl Scheduler {
    pub fn new(executor: Arc<dyn UnitExecutor>) -> Self {
        Self {
            executor,
            ceiling: DEFAULT_CEILING,
        }
    }

    /// Set the admission ceiling (at least one)
    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = ceiling.max(1);
        self
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Execute every unit and collect one verdict per unit.
    ///
    /// Never fails: a unit whose task panics is recorded as `Errored`.
    /// Each result sequence is sorted by path.
    pub async fn scan_all(&self, repository: &str, units: Vec<ScanUnit>) -> ScanResultSet {
        let mut set = ScanResultSet::new(repository);
        if units.is_empty() {
            tracing::info!(repository = %repository, "No units to scan");
            return set;
        }

        tracing::info!(
            repository = %repository,
            units = units.len(),
            ceiling = self.ceiling,
            "Scanning units"
        );

        let gate = Arc::new(Semaphore::new(self.ceiling));
        let (tx, mut rx) = mpsc::channel::<ScanResult>(units.len());

        let mut handles = Vec::with_capacity(units.len());
        for unit in &units {
            let gate = Arc::clone(&gate);
            let executor = Arc::clone(&self.executor);
            let tx = tx.clone();
            let unit = unit.clone();

            handles.push(tokio::spawn(async move {
                let Ok(permit) = gate.acquire_owned().await else {
                    return;
                };
                let outcome = executor.execute(&unit).await;
                drop(permit);

                tracing::debug!(unit = %unit.path, verdict = %outcome.verdict, "Unit finished");
                // Capacity equals the unit count, so this never waits
                let _ = tx.send(ScanResult::new(unit.path, outcome.verdict)).await;
            }));
        }
        drop(tx);

        let mut verdicts: HashMap<NormalizedPath, ScanVerdict> = HashMap::with_capacity(units.len());
        while let Some(result) = rx.recv().await {
            verdicts.insert(result.path, result.verdict);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(repository = %repository, error = %e, "Scan task did not complete");
            }
        }

        for unit in units {
            let verdict = verdicts.remove(&unit.path).unwrap_or_else(|| {
                tracing::warn!(unit = %unit.path, "No verdict recorded, marking as errored");
                ScanVerdict::Errored
            });
            set.push(ScanResult::new(unit.path, verdict));
        }
        set.sort();

        let totals = set.totals();
        tracing::info!(
            repository = %repository,
            drifted = totals.drifted,
            errored = totals.errored,
            fresh = totals.fresh,
            "Repository scan finished"
        );
        set
    }
}
