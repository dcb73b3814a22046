//! CSV report persistence and aggregation
//!
//! Each scanned repository is stored as `<folder>_report.csv` with one
//! `path,status` row per unit and no header. Aggregation reads every report
//! in a directory back and merges them under a single root.

use std::path::{Path, PathBuf};

use drift_fs::{NormalizedPath, RobustnessConfig, io};

use crate::discovery::EnvironmentAllowlist;
use crate::report::ReportNode;
use crate::verdict::{ScanResult, ScanResultSet, ScanVerdict, Totals};
use crate::{Error, Result};

/// Suffix appended to the repository folder name
pub const REPORT_SUFFIX: &str = "_report.csv";

/// Default name of the aggregated root node
pub const DEFAULT_ROOT: &str = "reports";

/// File name of the report for `repository`
pub fn report_file_name(repository: &str) -> String {
    let folder = drift_git::repository_folder(repository)
        .unwrap_or_else(|_| repository.replace(['/', '\\', ':'], "_"));
    format!("{}{}", folder, REPORT_SUFFIX)
}

/// Encode a result set as CSV: drifted rows, then errors, then fresh.
pub fn encode_report(results: &ScanResultSet) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for result in results.results() {
        writer.write_record([result.path.as_str(), result.verdict.label()])?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Atomically write the report for `results` to `path`
pub fn write_report_csv(
    path: &NormalizedPath,
    results: &ScanResultSet,
    robustness: RobustnessConfig,
) -> Result<()> {
    let content = encode_report(results)?;
    io::write_atomic(path, &content, robustness)?;
    tracing::debug!(path = %path, rows = results.len(), "Report written");
    Ok(())
}

/// Read one report file back into a result set.
///
/// The repository name is taken from the file name.
pub fn read_report_csv(path: &Path) -> Result<ScanResultSet> {
    let repository = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .map(|name| name.strip_suffix(REPORT_SUFFIX).unwrap_or(&name).to_string())
        .unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    let mut results = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let (Some(unit), Some(label)) = (record.get(0), record.get(1)) else {
            return Err(Error::Report {
                path: path.to_path_buf(),
                message: format!("row {} has fewer than two columns", index + 1),
            });
        };
        let verdict = ScanVerdict::parse(label).ok_or_else(|| Error::Report {
            path: path.to_path_buf(),
            message: format!("row {} has unknown status '{}'", index + 1, label),
        })?;
        results.push(ScanResult::new(unit, verdict));
    }

    Ok(ScanResultSet::from_results(repository, results))
}

/// Report files in `dir`, sorted by file name. A missing directory has none.
fn report_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(drift_fs::Error::io(dir, e).into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| drift_fs::Error::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read every report in `dir`. Fails on the first unreadable file.
pub fn load_reports(dir: &Path) -> Result<Vec<ScanResultSet>> {
    report_files(dir)?
        .iter()
        .map(|path| read_report_csv(path))
        .collect()
}

/// Merged view over a directory of reports
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub root: ReportNode,
    pub totals: Totals,
    /// Number of reports merged
    pub reports: usize,
    /// Files that could not be read, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

/// Merge every report in `dir` under a root named `root_name`.
///
/// Unreadable files are skipped with a warning.
pub fn aggregate(dir: &Path, root_name: &str, tags: &EnvironmentAllowlist) -> Result<Aggregate> {
    let mut root = ReportNode::new(root_name);
    let mut totals = Totals::default();
    let mut reports = 0;
    let mut skipped = Vec::new();

    for path in report_files(dir)? {
        match read_report_csv(&path) {
            Ok(set) => {
                let (tree, counts) = ReportNode::from_result_set(&set, tags);
                root = root.merge(tree.with_name(root_name));
                totals += counts;
                reports += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable report");
                skipped.push((path, e.to_string()));
            }
        }
    }

    tracing::debug!(dir = %dir.display(), reports, "Reports aggregated");
    Ok(Aggregate {
        root,
        totals,
        reports,
        skipped,
    })
}
