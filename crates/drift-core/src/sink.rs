//! Destinations for finished repository scans

use drift_fs::{NormalizedPath, RobustnessConfig};

use crate::Result;
use crate::cycle::ScanId;
use crate::export::{report_file_name, write_report_csv};
use crate::verdict::ScanResultSet;

/// Receives the results of each scanned repository
pub trait ReportSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn publish(&self, scan_id: &ScanId, results: &ScanResultSet) -> Result<()>;
}

/// Human-readable summary of one repository's results
pub fn summary_message(results: &ScanResultSet) -> String {
    let totals = results.totals();
    format!(
        "Drift report for `{}`\nErrors: {}\nDrifted: {}\nNo changes: {}",
        results.repository, totals.errored, totals.drifted, totals.fresh
    )
}

/// Logs a summary of each repository
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn publish(&self, scan_id: &ScanId, results: &ScanResultSet) -> Result<()> {
        let totals = results.totals();
        tracing::info!(
            scan_id = %scan_id,
            repository = %results.repository,
            errored = totals.errored,
            drifted = totals.drifted,
            fresh = totals.fresh,
            "{}",
            summary_message(results)
        );
        for path in &results.drifted {
            tracing::info!(scan_id = %scan_id, unit = %path, "Drift detected");
        }
        Ok(())
    }
}

/// Writes `<dir>/<repo>_report.csv` for each repository
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: NormalizedPath,
    robustness: RobustnessConfig,
}

impl CsvSink {
    pub fn new(dir: impl Into<NormalizedPath>) -> Self {
        Self {
            dir: dir.into(),
            robustness: RobustnessConfig::default(),
        }
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }

    /// Where the report for `repository` is written
    pub fn report_path(&self, repository: &str) -> NormalizedPath {
        self.dir.join(&report_file_name(repository))
    }
}

impl ReportSink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn publish(&self, scan_id: &ScanId, results: &ScanResultSet) -> Result<()> {
        let path = self.report_path(&results.repository);
        write_report_csv(&path, results, self.robustness)?;
        tracing::info!(scan_id = %scan_id, repository = %results.repository, path = %path, "Report saved");
        Ok(())
    }
}

/// Fans out to several sinks; one failing sink does not stop the others
#[derive(Default)]
pub struct Sinks {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl Sinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn ReportSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Publish to every sink, returning how many failed
    pub fn publish_all(&self, scan_id: &ScanId, results: &ScanResultSet) -> usize {
        let mut failures = 0;
        for sink in &self.sinks {
            if let Err(e) = sink.publish(scan_id, results) {
                failures += 1;
                tracing::error!(
                    sink = sink.name(),
                    repository = %results.repository,
                    error = %e,
                    "Failed to publish report"
                );
            }
        }
        failures
    }
}
