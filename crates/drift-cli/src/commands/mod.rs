//! Command implementations for drift-cli

pub mod classify;
pub mod discover;
pub mod report;
pub mod scan;
pub mod watch;

pub use classify::run_classify;
pub use discover::run_discover;
pub use report::run_report;
pub use scan::run_scan;
pub use watch::run_watch;
