//! Concurrent drift scan engine
//!
//! This crate turns a set of infrastructure repositories into drift reports:
//!
//! - **Discovery**: find deployable units (directories holding a descriptor
//!   file) and keep only those under an allow-listed environment
//! - **Execution**: run the planning tool per unit with environment-scoped
//!   credentials and a deadline
//! - **Classification**: map raw plan output to a [`ScanVerdict`]
//! - **Scheduling**: fan out executions behind a fixed admission ceiling and
//!   join on all of them
//! - **Aggregation**: fold flat `(path, verdict)` results into mergeable
//!   [`ReportNode`] trees
//!
//! # Architecture
//!
//! ```text
//!                    drift-cli
//!                        |
//!                   drift-core
//!                    |       |
//!               drift-fs  drift-git
//! ```
//!
//! A [`ScanCycle`] drives one pass over all configured repositories:
//! fetch, discover, schedule, publish to [`ReportSink`]s, then remove the
//! local copy. The crate keeps no state between cycles.

pub mod classify;
pub mod config;
pub mod cycle;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod export;
pub mod report;
pub mod scheduler;
pub mod sink;
pub mod verdict;

pub use classify::{Classifier, Markers, Outcome, UnmatchedPolicy, classify};
pub use config::{DriftConfig, GitConfig, PlanConfig};
pub use cycle::{CycleSummary, RepositoryOutcome, ScanCycle, ScanId};
pub use discovery::{Discoverer, EnvironmentAllowlist, discover};
pub use error::{Error, Result};
pub use executor::{PlanCommand, PlanExecutor, UnitExecutor};
pub use export::{Aggregate, aggregate, load_reports, read_report_csv, write_report_csv};
pub use report::ReportNode;
pub use scheduler::{DEFAULT_CEILING, Scheduler};
pub use sink::{CsvSink, LogSink, ReportSink, Sinks};
pub use verdict::{ScanResult, ScanResultSet, ScanUnit, ScanVerdict, Totals};
