//! Builder for [`Mirror`] instances.
//!
//! ```rust
//! use civitai_mirror::MirrorBuilder;
//! use std::time::Duration;
//!
//! let mirror = MirrorBuilder::hidden()
//!     .directory("downloads".into())
//!     .token("secret")
//!     .retries(5)
//!     .retry_delay(Duration::from_secs(2))
//!     .concurrent_downloads(8)
//!     .build()
//!     .unwrap();
//! ```

use super::config::{CategoryFilter, MirrorConfig};
use super::mirror::Mirror;
use crate::catalog::DownloadType;
use crate::error::Result;
use crate::progress::StyleOptions;
use crate::retry::RetryPolicy;

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::Proxy;
use std::path::PathBuf;
use std::time::Duration;

/// A builder used to create a [`Mirror`].
#[derive(Debug, Default)]
pub struct MirrorBuilder {
    config: MirrorConfig,
    download_type: Option<DownloadType>,
    exclude_type: Option<DownloadType>,
}

impl MirrorBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        MirrorBuilder::default()
    }

    /// Convenience function to hide the progress bars.
    pub fn hidden() -> Self {
        let mut builder = MirrorBuilder::default();
        builder.config.style_options = StyleOptions::hidden();
        builder
    }

    /// Sets the root of the downloaded tree.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.directory = directory;
        self
    }

    /// Sets where summaries and failure logs go.
    pub fn logs_directory(mut self, directory: PathBuf) -> Self {
        self.config.logs_directory = directory;
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    /// Point the catalog walk at another models endpoint.
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.config.api_base = api_base.into();
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.config.nsfw = nsfw;
        self
    }

    /// Set the total number of attempts per request.
    pub fn retries(mut self, max_attempts: u32) -> Self {
        self.config.retry = RetryPolicy::new(max_attempts, self.config.retry.delay);
        self
    }

    /// Set the pause between two attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry.delay = delay;
        self
    }

    /// Set the number of concurrent downloads.
    pub fn concurrent_downloads(mut self, concurrent_downloads: usize) -> Self {
        self.config.concurrent_downloads = concurrent_downloads.max(1);
        self
    }

    /// Only download one category. Conflicts with [`exclude_type`](Self::exclude_type).
    pub fn download_type(mut self, download_type: DownloadType) -> Self {
        self.download_type = Some(download_type);
        self
    }

    /// Download everything but one category.
    pub fn exclude_type(mut self, exclude_type: DownloadType) -> Self {
        self.exclude_type = Some(exclude_type);
        self
    }

    pub fn max_path_length(mut self, max_path_length: usize) -> Self {
        self.config.max_path_length = max_path_length;
        self
    }

    /// Weights payloads below this many bytes are discarded and retried.
    pub fn min_weights_size(mut self, min_weights_size: u64) -> Self {
        self.config.min_weights_size = min_weights_size;
        self
    }

    /// Set the progress bar style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.read_timeout = timeout;
        self
    }

    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.config.http.proxy = Some(proxy);
        self
    }

    /// Add http headers sent with every request.
    ///
    /// Can be called several times, the maps are merged.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.config
            .http
            .headers
            .get_or_insert_with(HeaderMap::new)
            .extend(headers);
        self
    }

    /// Add one http header sent with every request.
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.config
            .http
            .headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    /// Create the [`Mirror`] with the specified options.
    ///
    /// Fails when both a download type and an exclude type were set, when
    /// excluding `All`, or when the API base is not a valid URL.
    pub fn build(mut self) -> Result<Mirror> {
        self.config.filter = CategoryFilter::from_options(self.download_type, self.exclude_type)?;
        Mirror::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::error::Error;
    use reqwest::header::USER_AGENT;

    #[test]
    fn test_builder_sets_options() {
        let mirror = MirrorBuilder::hidden()
            .directory("out".into())
            .logs_directory("out/logs".into())
            .retries(0)
            .retry_delay(Duration::from_millis(5))
            .concurrent_downloads(0)
            .download_type(DownloadType::Only(Category::Lora))
            .header(USER_AGENT, HeaderValue::from_static("test"))
            .build()
            .unwrap();

        let config = mirror.config();
        assert_eq!(config.directory, PathBuf::from("out"));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.delay, Duration::from_millis(5));
        assert_eq!(config.concurrent_downloads, 1);
        assert_eq!(config.filter, CategoryFilter::Include(DownloadType::Only(Category::Lora)));
        assert!(config.http.headers.as_ref().unwrap().contains_key(USER_AGENT));
    }

    #[test]
    fn test_builder_rejects_both_filters() {
        let err = MirrorBuilder::hidden()
            .download_type(DownloadType::Only(Category::Lora))
            .exclude_type(DownloadType::Only(Category::Other))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_rejects_bad_api_base() {
        let err = MirrorBuilder::hidden().api_base("not a url").build().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
