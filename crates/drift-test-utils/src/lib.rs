//! Shared test utilities for the drift-detector workspace.
//!
//! This crate provides standardised test fixtures so crate test suites do
//! not each hand-roll unit trees and fake planning tools. It is a
//! dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: git repository fixtures holding unit trees
//! - [`tool`]: a scriptable stand-in for the planning tool
//! - [`tree`]: [`UnitTree`] builder for repository working trees

pub mod git;
pub mod tool;
pub mod tree;

pub use tool::{FakePlanTool, PlanScript};
pub use tree::UnitTree;

/// Plan output that reports pending changes.
pub const DRIFTED_OUTPUT: &str = "Terraform will perform the following actions:\n  # aws_s3_bucket.logs will be updated in-place\n";

/// Plan output that reports no changes.
pub const FRESH_OUTPUT: &str = "No changes. Your infrastructure matches the configuration.\n\nTerraform has compared your real infrastructure against your configuration and found no differences, so no changes are needed.\n";

/// Plan output that reports a configuration error.
pub const ERROR_OUTPUT: &str = "Error: Unsupported argument\n\n  on main.tf line 3, in resource \"aws_s3_bucket\" \"logs\":\n";
