//! Error handling for civitai-mirror.
//!
//! A single [`Error`] enum covers the catalog walk, the download engine and the
//! configuration layer. [`Error::is_retryable`] decides which failures the fixed
//! retry loops try again and which ones end a task or a creator run.

use reqwest::StatusCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can happen while mirroring a creator.
#[derive(Error, Debug)]
pub enum Error {
    /// A URL could not be parsed or built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// I/O Error.
    ///
    /// Raised by directory creation and file writes. Filesystem failures are
    /// terminal for the task that hit them.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library, usually while streaming a body.
    #[error("Reqwest error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error raised by the middleware stack while sending a request.
    #[error("Request error: {source}")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// The server answered with an unexpected, non-404 status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    /// The server answered 404; the content is genuinely absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A catalog response body could not be decoded.
    #[error("Malformed response: {source}")]
    MalformedResponse {
        #[from]
        source: serde_json::Error,
    },

    /// A completed model binary is smaller than the configured minimum.
    #[error("{} is only {size} bytes, expected at least {minimum}", path.display())]
    UndersizedPayload {
        path: PathBuf,
        size: u64,
        minimum: u64,
    },

    /// The catalog could not be read after every attempt.
    #[error("Catalog unavailable for {creator} after {attempts} attempts: {source}")]
    CatalogUnavailable {
        creator: String,
        attempts: u32,
        source: Box<Error>,
    },

    /// A catalog entry lacks what is needed to download it.
    #[error("Invalid catalog entry: {0}")]
    InvalidEntry(String),

    /// The configuration is contradictory or incomplete.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the fixed-delay retry loops should try again after this error.
    ///
    /// Transport failures, unexpected statuses, undecodable bodies and truncated
    /// payloads are transient. A 404 and anything touching the local filesystem
    /// are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Reqwest { .. }
            | Error::Middleware { .. }
            | Error::HttpStatus { .. }
            | Error::MalformedResponse { .. }
            | Error::UndersizedPayload { .. } => true,
            Error::NotFound(_)
            | Error::IOError { .. }
            | Error::InvalidUrl(_)
            | Error::InvalidEntry(_)
            | Error::CatalogUnavailable { .. }
            | Error::Config(_) => false,
        }
    }
}

/// Result type alias for civitai-mirror operations.
pub type Result<T> = std::result::Result<T, Error>;
