//! Filesystem abstraction for the drift detector
//!
//! Provides normalized unit paths, the fixed filesystem markers the planning
//! tool relies on, atomic report writes and format-agnostic config loading.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigFormat, ConfigStore};
pub use constants::UnitMarker;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::{NormalizedPath, is_hidden_name};
