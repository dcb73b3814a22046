//! Discover command implementation

use std::path::Path;

use colored::Colorize;
use drift_core::{Discoverer, EnvironmentAllowlist};

use crate::error::Result;

/// List the units under `dir`, allow-listed ones only unless `all`
pub fn run_discover(dir: &Path, discoverer: &Discoverer, allowlist: &EnvironmentAllowlist, all: bool) -> Result<()> {
    let paths = discoverer.discover(dir)?;
    let found = paths.len();

    let mut listed = 0;
    for path in paths {
        match allowlist.admit(&path) {
            Some(unit) => {
                println!("{}  {}", unit.path, unit.environment.cyan());
                listed += 1;
            }
            None if all => {
                println!("{}  {}", path, "(not allowed)".dimmed());
                listed += 1;
            }
            None => {}
        }
    }

    println!();
    println!("{} of {} units listed", listed, found);
    Ok(())
}
