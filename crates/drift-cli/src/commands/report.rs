//! Report command implementation

use std::path::Path;

use colored::Colorize;
use drift_core::{EnvironmentAllowlist, aggregate};

use crate::error::Result;

/// Run the report command
pub fn run_report(dir: &Path, root: &str, tags: &EnvironmentAllowlist, json: bool) -> Result<()> {
    let merged = aggregate(dir, root, tags)?;

    if json {
        let skipped: Vec<_> = merged
            .skipped
            .iter()
            .map(|(path, reason)| serde_json::json!({ "path": path.display().to_string(), "reason": reason }))
            .collect();
        let output = serde_json::json!({
            "root": merged.root,
            "totals": merged.totals,
            "reports": merged.reports,
            "skipped": skipped,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if merged.reports == 0 {
        println!("{} in {}", "No reports".yellow(), dir.display());
    } else {
        print!("{}", merged.root.render_text());
    }
    for (path, reason) in &merged.skipped {
        println!("{} {}: {}", "skipped".red(), path.display(), reason);
    }

    println!();
    println!(
        "{}: {} drifted, {} errored, {} unchanged",
        "Total".bold(),
        merged.totals.drifted.to_string().yellow(),
        merged.totals.errored.to_string().red(),
        merged.totals.fresh.to_string().green()
    );
    Ok(())
}
