//! civitai-mirror downloads everything a Civitai creator published (model
//! files, preview and example images, metadata) into a deterministic folder tree.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use civitai_mirror::{MirrorBuilder, Error};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let mirror = MirrorBuilder::new()
//!     .directory("model_downloads".into())
//!     .token("my-api-token")
//!     .build()?;
//! let summary = mirror.process_creator("alice").await?;
//! println!("{} of {} items on disk", summary.downloaded, summary.selected);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`catalog`] - Catalog pages, items and their categories
//! - [`layout`] - Name sanitizing and the on-disk layout
//! - [`download`] - The download engine, per-task summaries and the failure log
//! - [`mirror`] - Creator runs, the `Mirror` and its builder
//! - [`retry`] - The fixed-delay retry policy
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`http`] - HTTP client setup
//! - [`progress`] - Progress bar styling and display management
//! - [`utils`] - Header and query string helpers

pub mod catalog;
pub mod download;
pub mod error;
pub mod http;
pub mod layout;
pub mod mirror;
pub mod progress;
pub mod retry;
pub mod utils;

pub use catalog::{Category, CatalogClient, DownloadType};
pub use download::{DownloadEngine, DownloadTask, FailureLog, FailureRecord, Status, Summary};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use layout::{NameSanitizer, PathPlanner};
pub use mirror::{CategoryFilter, Mirror, MirrorBuilder, MirrorConfig, RunSummary};
pub use progress::{ProgressBarOpts, StyleOptions};
pub use retry::RetryPolicy;
