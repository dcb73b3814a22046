//! Repository sources for the drift detector
//!
//! A source materializes a named repository's working tree on local disk so
//! the scan engine can walk it. Two implementations are provided:
//!
//! - [`GitSource`]: clones over HTTPS (or any URL git2 understands)
//! - [`LocalSource`]: copies a tree that already exists on disk

pub mod clone;
pub mod error;
pub mod local;
pub mod source;

pub use clone::GitSource;
pub use error::{Error, Result};
pub use local::LocalSource;
pub use source::{RepositorySource, repository_folder};
