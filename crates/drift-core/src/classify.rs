//! Classification of raw plan output
//!
//! The planning tool prints one of a few well-known phrases depending on
//! whether it found pending changes. [`Classifier`] looks for those phrases
//! and turns the output into a [`ScanVerdict`]. It never runs anything.

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::verdict::ScanVerdict;

/// Phrases printed by the planning tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Printed when the configuration could not be planned
    pub error: String,
    /// Printed when the plan contains actions
    pub drift: String,
    /// Printed when the plan is empty
    pub fresh: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            error: "Error:".to_string(),
            drift: "Terraform will perform the following actions:".to_string(),
            fresh: "and found no differences, so no changes are needed.".to_string(),
        }
    }
}

/// What to do with output that contains none of the markers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Treat it as an empty plan
    #[default]
    Fresh,
    /// Treat it as a failed plan
    Errored,
}

/// Verdict for one unit, with the error that caused an `Errored` verdict
#[derive(Debug)]
pub struct Outcome {
    pub verdict: ScanVerdict,
    pub error: Option<Error>,
}

impl Outcome {
    /// An outcome without an error
    pub fn verdict(verdict: ScanVerdict) -> Self {
        Self {
            verdict,
            error: None,
        }
    }

    /// An `Errored` outcome caused by `error`
    pub fn errored(error: Error) -> Self {
        Self {
            verdict: ScanVerdict::Errored,
            error: Some(error),
        }
    }
}

/// Maps plan output to a verdict.
///
/// Priority: the error marker wins over everything; otherwise the drift
/// marker sets the drifted flag and the fresh marker clears it. Output with
/// no marker at all falls back to the [`UnmatchedPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    markers: Markers,
    unmatched: UnmatchedPolicy,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom marker phrases
    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    /// Choose the fallback for output without markers
    pub fn with_unmatched(mut self, unmatched: UnmatchedPolicy) -> Self {
        self.unmatched = unmatched;
        self
    }

    pub fn unmatched(&self) -> UnmatchedPolicy {
        self.unmatched
    }

    /// Classify `output` produced for the unit labelled `unit`.
    pub fn classify(&self, output: &[u8], unit: &str) -> Outcome {
        let text = String::from_utf8_lossy(output);

        if text.contains(self.markers.error.as_str()) {
            tracing::info!(unit = %unit, "Plan output reported an error");
            return Outcome::errored(Error::PlanReportedError {
                unit: unit.to_string(),
            });
        }

        let mut matched = false;
        let mut drifted = false;
        if text.contains(self.markers.drift.as_str()) {
            matched = true;
            drifted = true;
        }
        if text.contains(self.markers.fresh.as_str()) {
            matched = true;
            drifted = false;
        }

        if !matched {
            tracing::warn!(
                unit = %unit,
                fallback = ?self.unmatched,
                "Plan output matched no known marker"
            );
            return match self.unmatched {
                UnmatchedPolicy::Fresh => Outcome::verdict(ScanVerdict::Fresh),
                UnmatchedPolicy::Errored => Outcome::errored(Error::UnclassifiedOutput {
                    unit: unit.to_string(),
                }),
            };
        }

        let verdict = if drifted {
            ScanVerdict::Drifted
        } else {
            ScanVerdict::Fresh
        };
        tracing::info!(unit = %unit, verdict = %verdict, "Plan classified");
        Outcome::verdict(verdict)
    }
}

/// Classify with the default markers and fallback.
pub fn classify(output: &[u8], unit: &str) -> Outcome {
    Classifier::default().classify(output, unit)
}
