//! Shared utility functions.
//!
//! - [`headers`] - Content length and content kind extraction from HTTP responses
//! - [`query`] - Query-string helpers for authenticated catalog and download URLs

pub mod headers;
pub mod query;

pub use headers::{content_kind, corrected_path, get_content_length, ContentKind};
pub use query::{cursor_key, has_query_param, redacted, with_auth};
