//! Catalog records as returned by the models endpoint.
//!
//! Decoding is lenient: the endpoint happily returns `null` for strings and
//! lists, and only the item id is truly required. The raw JSON of every item is
//! kept so it can be dumped next to the downloads untouched.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::Result;

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A published catalog item (a "model" in Civitai terms).
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItem {
    pub id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// Declared type, e.g. `LORA` or `Checkpoint`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(rename = "modelVersions", default, deserialize_with = "nullable")]
    pub model_versions: Vec<ModelVersion>,
    /// The item exactly as received.
    #[serde(skip)]
    pub raw: Value,
}

impl CatalogItem {
    /// Decode an item while keeping its raw JSON.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut item: CatalogItem = serde_json::from_value(value.clone())?;
        item.raw = value;
        Ok(item)
    }

    /// Public page of the item on the site.
    pub fn page_url(&self) -> String {
        format!("https://civitai.com/models/{}", self.id)
    }
}

/// A published revision of an item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelVersion {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "baseModel", default)]
    pub base_model: Option<String>,
    #[serde(rename = "trainedWords", default, deserialize_with = "nullable")]
    pub trained_words: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub files: Vec<FileEntry>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Vec<ImageEntry>,
}

/// A downloadable file of a version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileEntry {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "downloadUrl", default, deserialize_with = "nullable")]
    pub download_url: String,
    /// Per-file type tag, e.g. `Model` or `Training Data`.
    #[serde(rename = "type", default)]
    pub declared_type: Option<String>,
}

/// An example image (or video) attached to a version.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageEntry {
    /// Missing on broken entries, which cannot be named on disk.
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    /// `image` or `video`. Absent means image.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ImageEntry {
    pub fn is_video(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|kind| kind.eq_ignore_ascii_case("video"))
    }

    /// Entries with an id and a url can be downloaded.
    pub fn is_valid(&self) -> bool {
        self.id.is_some() && !self.url.is_empty()
    }
}

/// Pagination block of a response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMetadata {
    #[serde(rename = "nextPage", default)]
    pub next_page: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.next_page.is_none() && self.rest.is_empty()
    }
}

/// Body of a models listing response, before items are decoded.
#[derive(Debug, Deserialize)]
pub(crate) struct RawPage {
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<Value>,
    #[serde(default)]
    pub metadata: Option<PageMetadata>,
}

/// One decoded page of catalog items.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    /// 1-based position of the page in the walk.
    pub number: usize,
    pub items: Vec<CatalogItem>,
    /// Continuation cursor announced by this page.
    pub next_page: Option<String>,
}
