//! Scan units, verdicts and per-repository result sets

use std::ops::{Add, AddAssign};

use drift_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

/// One deployable unit admitted for scanning
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanUnit {
    /// Path relative to the scan root, starting with the repository folder
    pub path: NormalizedPath,
    /// The allow-listed environment segment the unit was admitted under
    pub environment: String,
}

impl ScanUnit {
    /// Create a new scan unit
    pub fn new(path: impl Into<NormalizedPath>, environment: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            environment: environment.into(),
        }
    }
}

/// Tri-state classification of one plan run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanVerdict {
    /// The plan reported pending changes
    Drifted,
    /// The plan reported no changes
    Fresh,
    /// The plan could not run or reported an error
    Errored,
}

impl ScanVerdict {
    /// All verdicts in report order
    pub const ALL: [ScanVerdict; 3] = [ScanVerdict::Drifted, ScanVerdict::Errored, ScanVerdict::Fresh];

    /// Label used in CSV reports
    pub fn label(&self) -> &'static str {
        match self {
            ScanVerdict::Drifted => "drifted",
            ScanVerdict::Fresh => "No changes",
            ScanVerdict::Errored => "error",
        }
    }

    /// Parse a report label.
    ///
    /// Accepts the CSV labels plus the `fresh` and `errored` aliases.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "drifted" => Some(ScanVerdict::Drifted),
            "No changes" | "fresh" => Some(ScanVerdict::Fresh),
            "error" | "errored" => Some(ScanVerdict::Errored),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScanVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A `(path, verdict)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanResult {
    pub path: NormalizedPath,
    pub verdict: ScanVerdict,
}

impl ScanResult {
    pub fn new(path: impl Into<NormalizedPath>, verdict: ScanVerdict) -> Self {
        Self {
            path: path.into(),
            verdict,
        }
    }
}

/// Per-status counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub errored: usize,
    pub drifted: usize,
    pub fresh: usize,
}

impl Totals {
    /// Count one verdict
    pub fn record(&mut self, verdict: ScanVerdict) {
        match verdict {
            ScanVerdict::Drifted => self.drifted += 1,
            ScanVerdict::Fresh => self.fresh += 1,
            ScanVerdict::Errored => self.errored += 1,
        }
    }

    /// Count for a single verdict
    pub fn count(&self, verdict: ScanVerdict) -> usize {
        match verdict {
            ScanVerdict::Drifted => self.drifted,
            ScanVerdict::Fresh => self.fresh,
            ScanVerdict::Errored => self.errored,
        }
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.errored + self.drifted + self.fresh
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, other: Totals) -> Totals {
        Totals {
            errored: self.errored + other.errored,
            drifted: self.drifted + other.drifted,
            fresh: self.fresh + other.fresh,
        }
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, other: Totals) {
        *self = *self + other;
    }
}

/// Results of scanning one repository
///
/// The three sequences are disjoint; every admitted unit appears in exactly
/// one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResultSet {
    /// Repository identifier as configured
    pub repository: String,
    pub drifted: Vec<NormalizedPath>,
    pub errored: Vec<NormalizedPath>,
    pub fresh: Vec<NormalizedPath>,
}

impl ScanResultSet {
    /// Create an empty result set for `repository`
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            ..Self::default()
        }
    }

    /// Build a sorted result set from individual results
    pub fn from_results(
        repository: impl Into<String>,
        results: impl IntoIterator<Item = ScanResult>,
    ) -> Self {
        let mut set = Self::new(repository);
        for result in results {
            set.push(result);
        }
        set.sort();
        set
    }

    /// Append a result to the sequence matching its verdict
    pub fn push(&mut self, result: ScanResult) {
        self.paths_mut(result.verdict).push(result.path);
    }

    /// Paths carrying `verdict`
    pub fn paths(&self, verdict: ScanVerdict) -> &[NormalizedPath] {
        match verdict {
            ScanVerdict::Drifted => &self.drifted,
            ScanVerdict::Fresh => &self.fresh,
            ScanVerdict::Errored => &self.errored,
        }
    }

    fn paths_mut(&mut self, verdict: ScanVerdict) -> &mut Vec<NormalizedPath> {
        match verdict {
            ScanVerdict::Drifted => &mut self.drifted,
            ScanVerdict::Fresh => &mut self.fresh,
            ScanVerdict::Errored => &mut self.errored,
        }
    }

    /// Sort each sequence by path
    pub fn sort(&mut self) {
        self.drifted.sort();
        self.errored.sort();
        self.fresh.sort();
    }

    /// Iterate over all results: drifted, then errored, then fresh
    pub fn results(&self) -> impl Iterator<Item = ScanResult> + '_ {
        ScanVerdict::ALL.into_iter().flat_map(move |verdict| {
            self.paths(verdict)
                .iter()
                .map(move |path| ScanResult::new(path.clone(), verdict))
        })
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.drifted.len() + self.errored.len() + self.fresh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn totals(&self) -> Totals {
        Totals {
            errored: self.errored.len(),
            drifted: self.drifted.len(),
            fresh: self.fresh.len(),
        }
    }
}
