//! Configuration of a [`Mirror`](super::Mirror).

use crate::catalog::{Category, DownloadType, DEFAULT_API_BASE};
use crate::download::MIN_WEIGHTS_SIZE;
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::layout::MAX_PATH_LENGTH;
use crate::progress::StyleOptions;
use crate::retry::RetryPolicy;

use std::fmt;
use std::path::PathBuf;

/// Which categories get downloaded.
///
/// Either one category (or `All`) is included, or one category is excluded.
/// The two never combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    Include(DownloadType),
    Exclude(Category),
}

impl Default for CategoryFilter {
    fn default() -> Self {
        CategoryFilter::Include(DownloadType::All)
    }
}

impl CategoryFilter {
    /// Build the filter from the two mutually exclusive options.
    pub fn from_options(
        download_type: Option<DownloadType>,
        exclude_type: Option<DownloadType>,
    ) -> Result<Self> {
        match (download_type, exclude_type) {
            (Some(_), Some(_)) => Err(Error::Config(
                "a download type and an exclude type cannot be combined".into(),
            )),
            (Some(include), None) => Ok(CategoryFilter::Include(include)),
            (None, Some(DownloadType::Only(category))) => Ok(CategoryFilter::Exclude(category)),
            (None, Some(DownloadType::All)) => {
                Err(Error::Config("excluding All would download nothing".into()))
            }
            (None, None) => Ok(CategoryFilter::default()),
        }
    }

    pub fn accepts(&self, category: Category) -> bool {
        match self {
            CategoryFilter::Include(download_type) => download_type.matches(category),
            CategoryFilter::Exclude(excluded) => *excluded != category,
        }
    }

    /// Categories whose folders hold this filter's downloads.
    pub fn selected_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.accepts(*c))
            .collect()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::Include(t) => write!(f, "Download type: {t}"),
            CategoryFilter::Exclude(c) => write!(f, "Excluding type: {c}"),
        }
    }
}

/// Configuration structure of a mirror run.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Root of the downloaded tree.
    pub directory: PathBuf,
    /// Where summaries and failure logs are written.
    pub logs_directory: PathBuf,
    /// Civitai API token.
    pub token: String,
    /// Models listing endpoint.
    pub api_base: String,
    /// Ask for nsfw content too.
    pub nsfw: bool,
    /// Attempts and pause for catalog requests and downloads alike.
    pub retry: RetryPolicy,
    /// Width of the download worker pool.
    pub concurrent_downloads: usize,
    pub filter: CategoryFilter,
    /// Full destination path ceiling for sanitized names.
    pub max_path_length: usize,
    /// Smallest acceptable model weights file.
    pub min_weights_size: u64,
    pub style_options: StyleOptions,
    pub http: HttpClientConfig,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("model_downloads"),
            logs_directory: PathBuf::from("logs"),
            token: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            nsfw: true,
            retry: RetryPolicy::default(),
            concurrent_downloads: 5,
            filter: CategoryFilter::default(),
            max_path_length: MAX_PATH_LENGTH,
            min_weights_size: MIN_WEIGHTS_SIZE,
            style_options: StyleOptions::default(),
            http: HttpClientConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_exclusivity() {
        let err = CategoryFilter::from_options(
            Some(DownloadType::Only(Category::Lora)),
            Some(DownloadType::Only(Category::Other)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(CategoryFilter::from_options(None, Some(DownloadType::All)).is_err());
        assert_eq!(
            CategoryFilter::from_options(None, None).unwrap(),
            CategoryFilter::Include(DownloadType::All)
        );
    }

    #[test]
    fn test_filter_accepts() {
        let only_lora = CategoryFilter::Include(DownloadType::Only(Category::Lora));
        assert!(only_lora.accepts(Category::Lora));
        assert!(!only_lora.accepts(Category::Checkpoints));
        assert_eq!(only_lora.selected_categories(), vec![Category::Lora]);

        let no_other = CategoryFilter::Exclude(Category::Other);
        assert!(no_other.accepts(Category::Embeddings));
        assert!(!no_other.accepts(Category::Other));
        assert_eq!(no_other.selected_categories().len(), 4);

        assert_eq!(CategoryFilter::default().selected_categories().len(), 5);
    }

    #[test]
    fn test_default_config() {
        let config = MirrorConfig::default();
        assert_eq!(config.concurrent_downloads, 5);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }
}
