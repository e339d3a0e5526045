//! Catalog access and classification.
//!
//! - [`model`] - Items, versions, files and images as decoded from the API
//! - [`category`] - Item and file categorization
//! - [`survey`] - Per-creator category tally
//! - [`client`] - Paginated traversal of the models endpoint

pub mod category;
pub mod client;
pub mod model;
pub mod survey;

pub use category::{categorize, classify_file, find_training_data_files, Category, DownloadType};
pub use client::{CatalogClient, DEFAULT_API_BASE};
pub use model::{CatalogItem, CatalogPage, FileEntry, ImageEntry, ModelVersion, PageMetadata};
pub use survey::CatalogSurvey;
