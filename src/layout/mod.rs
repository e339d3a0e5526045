//! Destination naming and directory layout.
//!
//! - [`sanitize`] - Filesystem-safe names under a path-length budget
//! - [`planner`] - Deterministic folders and file paths per item version

pub mod planner;
pub mod sanitize;

pub use planner::{is_item_label, PathPlanner, VersionLayout};
pub use sanitize::{NameSanitizer, SanitizeContext, MAX_PATH_LENGTH};
