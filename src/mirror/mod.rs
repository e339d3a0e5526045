//! Creator runs: configuration, builder, orchestration and bookkeeping.

pub mod builder;
pub mod config;
pub mod mirror;
pub mod report;

pub use builder::MirrorBuilder;
pub use config::{CategoryFilter, MirrorConfig};
pub use mirror::Mirror;
pub use report::{RunSummary, SummaryCounts, TaskTally};
