//! Classify command implementation

use std::path::Path;

use colored::Colorize;
use drift_core::{Classifier, ScanVerdict};

use crate::error::Result;

/// Classify a saved plan output file and print the verdict
pub fn run_classify(file: &Path, classifier: &Classifier) -> Result<()> {
    let output = std::fs::read(file)?;
    let outcome = classifier.classify(&output, &file.display().to_string());

    let label = match outcome.verdict {
        ScanVerdict::Drifted => outcome.verdict.label().yellow(),
        ScanVerdict::Errored => outcome.verdict.label().red(),
        ScanVerdict::Fresh => outcome.verdict.label().green(),
    };
    println!("{}", label);
    if let Some(error) = outcome.error {
        println!("{}", error.to_string().dimmed());
    }
    Ok(())
}
