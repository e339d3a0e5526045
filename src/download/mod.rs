//! Downloading payloads to disk.
//!
//! - [`task`] - What to fetch and where to put it
//! - [`summary`] - Per-task outcome
//! - [`failure_log`] - Durable, append-only failure records
//! - [`engine`] - Streaming downloads with retry and size checks

pub mod engine;
pub mod failure_log;
pub mod summary;
pub mod task;

pub use engine::{DownloadEngine, EngineConfig, MIN_WEIGHTS_SIZE};
pub use failure_log::{FailureLog, FailureRecord};
pub use summary::{Status, Summary};
pub use task::{DownloadTask, PayloadKind};
