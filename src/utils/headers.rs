//! Response header helpers.
//!
//! The catalog's declared file extensions are not always right, so the engine
//! trusts the `Content-Type` of the actual response for media payloads.

use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use std::path::{Path, PathBuf};

/// Canonical extension written for any `image/*` response.
pub const IMAGE_EXTENSION: &str = "jpg";
/// Canonical extension written for any `video/*` response.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Broad kind of a response body, derived from its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Image,
    Video,
    Other,
}

impl ContentKind {
    /// Parse a raw `Content-Type` value.
    pub fn from_mime(content_type: &str) -> Self {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("image") {
            ContentKind::Image
        } else if content_type.contains("video") {
            ContentKind::Video
        } else {
            ContentKind::Other
        }
    }

    /// The extension this kind forces on the destination, if any.
    pub fn canonical_extension(self) -> Option<&'static str> {
        match self {
            ContentKind::Image => Some(IMAGE_EXTENSION),
            ContentKind::Video => Some(VIDEO_EXTENSION),
            ContentKind::Other => None,
        }
    }
}

/// Read the content kind of a response.
pub fn content_kind(response: &Response) -> ContentKind {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ContentKind::from_mime)
        .unwrap_or(ContentKind::Other)
}

/// Rewrite the planned destination so its extension matches the content kind.
///
/// ```rust
/// use civitai_mirror::utils::{corrected_path, ContentKind};
/// use std::path::Path;
///
/// let planned = Path::new("out/preview.jpeg");
/// assert_eq!(corrected_path(planned, ContentKind::Image), Path::new("out/preview.jpg"));
/// assert_eq!(corrected_path(planned, ContentKind::Other), Path::new("out/preview.jpeg"));
/// ```
pub fn corrected_path(planned: &Path, kind: ContentKind) -> PathBuf {
    match kind.canonical_extension() {
        Some(ext) => planned.with_extension(ext),
        None => planned.to_path_buf(),
    }
}

/// Total size announced by a response, or 0 when unknown.
pub fn get_content_length(response: &Response) -> u64 {
    response.content_length().unwrap_or(0)
}
