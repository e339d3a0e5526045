//! HTTP transport shared by the catalog client and the download engine.

pub mod client;

pub use client::{create_http_client, HttpClientConfig};
