//! A single file to fetch.

use crate::catalog::Category;
use crate::error::{Error, Result};
use crate::utils::headers::{IMAGE_EXTENSION, VIDEO_EXTENSION};

use reqwest::Url;
use std::path::{Path, PathBuf};

/// What a download is expected to be. Drives the post-download checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Large model weights. Subject to the minimum-size check.
    Weights,
    /// Any other model file (archives, pickles, small embeddings).
    File,
    /// A preview or example image or video.
    Image,
}

impl PayloadKind {
    /// Kind of a model file stored under `category`.
    ///
    /// Embeddings are legitimately tiny, so only non-embedding `.safetensors`
    /// files count as weights.
    pub fn for_file(file_name: &str, category: Category) -> Self {
        let is_safetensors = Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("safetensors"));
        if is_safetensors && category != Category::Embeddings {
            PayloadKind::Weights
        } else {
            PayloadKind::File
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PayloadKind::Weights | PayloadKind::File => "File",
            PayloadKind::Image => "Image",
        }
    }
}

/// Represents a file to be downloaded.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// URL of the payload, without credentials.
    pub source_url: Url,
    /// Planned destination. The engine may change its extension.
    pub destination: PathBuf,
    pub kind: PayloadKind,
    /// Display name of the catalog item the payload belongs to.
    pub item_name: String,
}

impl DownloadTask {
    pub fn new(
        source_url: Url,
        destination: impl Into<PathBuf>,
        kind: PayloadKind,
        item_name: impl Into<String>,
    ) -> Self {
        Self {
            source_url,
            destination: destination.into(),
            kind,
            item_name: item_name.into(),
        }
    }

    /// Creates a new [`DownloadTask`] from a raw URL string.
    pub fn try_new(
        source_url: &str,
        destination: impl Into<PathBuf>,
        kind: PayloadKind,
        item_name: impl Into<String>,
    ) -> Result<Self> {
        let url = Url::parse(source_url).map_err(|e| {
            Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", source_url, e))
        })?;
        Ok(Self::new(url, destination, kind, item_name))
    }

    /// Every path this task could have been written to.
    ///
    /// Media payloads are renamed after their content type, so a previous run may
    /// have left them under the canonical image or video extension.
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.destination.clone()];
        if self.kind == PayloadKind::Image {
            for ext in [IMAGE_EXTENSION, VIDEO_EXTENSION] {
                let alternative = self.destination.with_extension(ext);
                if !paths.contains(&alternative) {
                    paths.push(alternative);
                }
            }
        }
        paths
    }

    /// The first candidate path already present on disk.
    pub fn existing_destination(&self) -> Option<PathBuf> {
        self.candidate_paths().into_iter().find(|p| p.exists())
    }

    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
