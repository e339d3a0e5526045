//! Content categories.
//!
//! An item has one category derived from its declared type. Files are bucketed
//! separately: a file's extension and its own type tag can move it to another
//! category than its item, and filtering happens per file.

use super::model::{CatalogItem, FileEntry};
use std::fmt;
use std::str::FromStr;

/// Storage bucket of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Checkpoints,
    Embeddings,
    Lora,
    TrainingData,
    Other,
}

impl Category {
    /// Every category, in summary order.
    pub const ALL: [Category; 5] = [
        Category::Checkpoints,
        Category::Embeddings,
        Category::Lora,
        Category::TrainingData,
        Category::Other,
    ];

    /// Directory name, also used in summaries and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Checkpoints => "Checkpoints",
            Category::Embeddings => "Embeddings",
            Category::Lora => "Lora",
            Category::TrainingData => "Training_Data",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category {s:?}"))
    }
}

/// Filter value: a category or every category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadType {
    All,
    Only(Category),
}

impl DownloadType {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            DownloadType::All => true,
            DownloadType::Only(c) => *c == category,
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadType::All => f.write_str("All"),
            DownloadType::Only(c) => c.fmt(f),
        }
    }
}

impl FromStr for DownloadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(DownloadType::All)
        } else {
            s.parse().map(DownloadType::Only)
        }
    }
}

impl From<Category> for DownloadType {
    fn from(category: Category) -> Self {
        DownloadType::Only(category)
    }
}

/// Item-level category from the declared type, case-insensitively.
pub fn categorize(item: &CatalogItem) -> Category {
    categorize_type(item.kind.as_deref())
}

/// Category of a raw declared type string.
pub fn categorize_type(kind: Option<&str>) -> Category {
    match kind.map(str::to_ascii_uppercase).as_deref() {
        Some("CHECKPOINT") => Category::Checkpoints,
        Some("TEXTUALINVERSION") => Category::Embeddings,
        Some("LORA") => Category::Lora,
        Some("TRAINING_DATA") => Category::TrainingData,
        _ => Category::Other,
    }
}

const TRAINING_DATA_TAG: &str = "Training Data";

/// Names of files explicitly tagged as training data, across all versions.
pub fn find_training_data_files(item: &CatalogItem) -> Vec<String> {
    item.model_versions
        .iter()
        .flat_map(|v| v.files.iter())
        .filter(|f| f.declared_type.as_deref() == Some(TRAINING_DATA_TAG))
        .map(|f| f.name.clone())
        .collect()
}

/// Storage bucket of a single file of `item`.
pub fn classify_file(item: &CatalogItem, file: &FileEntry) -> Category {
    if file.declared_type.as_deref() == Some(TRAINING_DATA_TAG) {
        return Category::TrainingData;
    }

    let kind = item.kind.as_deref().unwrap_or_default().to_ascii_uppercase();
    let extension = file
        .name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "zip" => match kind.as_str() {
            "LORA" => Category::Lora,
            "TRAINING_DATA" => Category::TrainingData,
            _ => Category::Other,
        },
        "safetensors" => match kind.as_str() {
            "CHECKPOINT" => Category::Checkpoints,
            "TEXTUALINVERSION" => Category::Embeddings,
            "VAE" | "LOCON" => Category::Other,
            _ => Category::Lora,
        },
        "pt" => match kind.as_str() {
            "TEXTUALINVERSION" => Category::Embeddings,
            _ => Category::Other,
        },
        _ => categorize(item),
    }
}
