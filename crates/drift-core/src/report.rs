//! Report trees
//!
//! Flat `(path, verdict)` results are folded into a tree keyed by path
//! segment. Trees from different repositories (or different report files)
//! can be merged into one.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use drift_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::discovery::EnvironmentAllowlist;
use crate::verdict::{ScanResult, ScanResultSet, ScanVerdict, Totals};

/// One node of a report tree
///
/// Only unit nodes carry a status; intermediate directories do not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ScanVerdict>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, ReportNode>,
}

impl ReportNode {
    /// Create a node without status or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rename this node, keeping its contents
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Build a tree from flat results, counting verdicts as it goes.
    ///
    /// A unit whose last segment is itself an environment name (a unit
    /// placed directly at `repo/prod`) creates its node without a status.
    pub fn build(
        results: impl IntoIterator<Item = ScanResult>,
        tags: &EnvironmentAllowlist,
    ) -> (ReportNode, Totals) {
        let mut root = ReportNode::default();
        let mut totals = Totals::default();
        for result in results {
            totals.record(result.verdict);
            root.insert(&result.path, result.verdict, tags);
        }
        (root, totals)
    }

    /// Build a tree from a repository's result set
    pub fn from_result_set(set: &ScanResultSet, tags: &EnvironmentAllowlist) -> (ReportNode, Totals) {
        Self::build(set.results(), tags)
    }

    /// Walk or create the nodes for `path` and mark the last one.
    pub fn insert(&mut self, path: &NormalizedPath, verdict: ScanVerdict, tags: &EnvironmentAllowlist) {
        let mut node = self;
        let mut last = None;
        for segment in path.segments() {
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| ReportNode::new(segment));
            last = Some(segment);
        }

        if let Some(segment) = last
            && !tags.contains(segment)
        {
            node.status = Some(verdict);
        }
    }

    /// Union of two trees.
    ///
    /// `self` is the base: children with the same name are merged
    /// recursively and children only present in `other` are grafted as they
    /// are. Where both sides carry a status the left one is kept.
    pub fn merge(mut self, other: ReportNode) -> ReportNode {
        match (self.status, other.status) {
            (None, Some(status)) => self.status = Some(status),
            (Some(left), Some(right)) if left != right => {
                tracing::warn!(
                    node = %self.name,
                    kept = %left,
                    dropped = %right,
                    "Conflicting statuses while merging reports"
                );
            }
            _ => {}
        }

        for (name, child) in other.children {
            match self.children.remove(&name) {
                Some(existing) => {
                    self.children.insert(name, existing.merge(child));
                }
                None => {
                    self.children.insert(name, child);
                }
            }
        }
        self
    }

    /// All status-bearing nodes as `(path, verdict)` results, sorted by path.
    ///
    /// The root's own name is not part of the paths.
    pub fn flatten(&self) -> Vec<ScanResult> {
        let mut results = Vec::new();
        for child in self.children.values() {
            child.collect(String::new(), &mut results);
        }
        results.sort();
        results
    }

    fn collect(&self, prefix: String, out: &mut Vec<ScanResult>) {
        let path = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", prefix, self.name)
        };
        if let Some(status) = self.status {
            out.push(ScanResult::new(path.as_str(), status));
        }
        for child in self.children.values() {
            child.collect(path.clone(), out);
        }
    }

    /// Look up a descendant by slash-separated path
    pub fn get(&self, path: &str) -> Option<&ReportNode> {
        NormalizedPath::new(path)
            .segments()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    /// Paths of every node below the root, status or not
    pub fn node_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let mut stack: Vec<(String, &ReportNode)> = self
            .children
            .values()
            .map(|child| (child.name.clone(), child))
            .collect();
        while let Some((path, node)) = stack.pop() {
            for child in node.children.values() {
                stack.push((format!("{}/{}", path, child.name), child));
            }
            paths.push(path);
        }
        paths.sort();
        paths
    }

    /// Number of status-bearing nodes
    pub fn unit_count(&self) -> usize {
        usize::from(self.status.is_some())
            + self.children.values().map(ReportNode::unit_count).sum::<usize>()
    }

    /// Indented text rendering, children in lexicographic order
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let name = if self.name.is_empty() { "." } else { &self.name };
        self.render_line(name, 0, &mut out);
        out
    }

    fn render_line(&self, name: &str, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let _ = match self.status {
            Some(status) => writeln!(out, "{indent}{name} [{status}]"),
            None => writeln!(out, "{indent}{name}"),
        };
        for child in self.children.values() {
            child.render_line(&child.name, depth + 1, out);
        }
    }
}
