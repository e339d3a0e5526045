//! Transfer progress reporting.
//!
//! - `style` - Progress bar styling options and templates
//! - `display` - Page and transfer bar coordination

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};
