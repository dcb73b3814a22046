//! Fixed filesystem markers used by the planning tool.

use std::path::Path;

/// Well-known names inside a scanned repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitMarker {
    /// Descriptor file that turns a directory into a deployable unit
    Descriptor,
    /// Transient cache directory the planning tool creates inside a unit
    CacheDir,
    /// Plan artifact written by `plan -out=...`
    PlanFile,
}

impl UnitMarker {
    /// Get the string representation of the marker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Descriptor => "terragrunt.hcl",
            Self::CacheDir => ".terragrunt-cache",
            Self::PlanFile => "tfplan.out",
        }
    }
}

impl AsRef<Path> for UnitMarker {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for UnitMarker {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for UnitMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_dir_is_hidden() {
        assert!(crate::is_hidden_name(UnitMarker::CacheDir.as_str()));
        assert!(!crate::is_hidden_name(UnitMarker::Descriptor.as_str()));
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(UnitMarker::PlanFile.to_string(), "tfplan.out");
    }
}
