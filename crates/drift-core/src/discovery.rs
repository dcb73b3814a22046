//! Unit discovery
//!
//! A unit is any directory that directly contains the descriptor file.
//! Hidden directories (the tool's own cache, `.git`) are never descended
//! into.

use std::path::Path;

use drift_fs::{NormalizedPath, UnitMarker, is_hidden_name};
use walkdir::{DirEntry, WalkDir};

use crate::verdict::ScanUnit;
use crate::{Error, Result};

/// Walks a repository tree looking for unit descriptors
#[derive(Debug, Clone)]
pub struct Discoverer {
    descriptor: String,
}

impl Default for Discoverer {
    fn default() -> Self {
        Self {
            descriptor: UnitMarker::Descriptor.as_str().to_string(),
        }
    }
}

impl Discoverer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for a different descriptor file name
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = descriptor.into();
        self
    }

    /// Find every unit under `root`.
    ///
    /// Paths are relative to the parent of `root`, so they start with the
    /// repository folder name. Order is a depth-first walk with siblings
    /// sorted by name. Any traversal error aborts the whole walk.
    pub fn discover(&self, root: &Path) -> Result<Vec<NormalizedPath>> {
        let root = dunce::canonicalize(root).map_err(|e| Error::Discovery {
            root: root.to_path_buf(),
            message: e.to_string(),
        })?;
        let base = NormalizedPath::new(root.parent().unwrap_or(&root));

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden_dir(entry));

        let mut units = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| Error::Discovery {
                root: root.clone(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_dir() || !entry.path().join(&self.descriptor).is_file() {
                continue;
            }

            let path = NormalizedPath::new(entry.path());
            let unit = path.strip_prefix(&base).unwrap_or(path);
            tracing::debug!(unit = %unit, "Discovered unit");
            units.push(unit);
        }

        tracing::debug!(root = %root.display(), count = units.len(), "Discovery finished");
        Ok(units)
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && is_hidden_name(&entry.file_name().to_string_lossy())
}

/// Find every unit under `root` using the default descriptor.
pub fn discover(root: &Path) -> Result<Vec<NormalizedPath>> {
    Discoverer::default().discover(root)
}

/// Environments whose units are scanned
///
/// The environment is the path segment right after the repository folder:
/// `infra/prod/app` belongs to `prod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentAllowlist {
    environments: Vec<String>,
}

impl Default for EnvironmentAllowlist {
    fn default() -> Self {
        Self::new(["prod", "dev"])
    }
}

impl EnvironmentAllowlist {
    pub fn new<I, S>(environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            environments: environments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn environments(&self) -> &[String] {
        &self.environments
    }

    /// Whether `segment` names an allow-listed environment
    pub fn contains(&self, segment: &str) -> bool {
        self.environments.iter().any(|env| env == segment)
    }

    /// Turn a discovered path into a unit if its environment is allowed
    pub fn admit(&self, path: &NormalizedPath) -> Option<ScanUnit> {
        let environment = path.segment(1)?;
        if self.contains(environment) {
            Some(ScanUnit::new(path.clone(), environment))
        } else {
            None
        }
    }

    /// Keep only admitted units, preserving order
    pub fn filter_units(&self, paths: impl IntoIterator<Item = NormalizedPath>) -> Vec<ScanUnit> {
        paths
            .into_iter()
            .filter_map(|path| {
                let unit = self.admit(&path);
                if unit.is_none() {
                    tracing::debug!(unit = %path, "Skipping unit outside allowed environments");
                }
                unit
            })
            .collect()
    }
}
