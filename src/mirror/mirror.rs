//! Creator-level orchestration.
//!
//! A creator run goes through two catalog walks. The first one only tallies the
//! catalog and persists the summary; the second one plans and downloads page by
//! page, each page settling completely before the next is requested.

use super::config::MirrorConfig;
use super::report::{self, RunSummary, TaskTally};
use crate::catalog::{classify_file, CatalogClient, CatalogItem, ModelVersion};
use crate::download::{DownloadEngine, DownloadTask, EngineConfig, FailureLog, FailureRecord, PayloadKind};
use crate::error::{Error, Result};
use crate::http::create_http_client;
use crate::layout::{NameSanitizer, PathPlanner, VersionLayout};
use crate::progress::ProgressDisplay;

use futures::stream::{self, StreamExt, TryStreamExt};
use regex::Regex;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use tokio::fs;
use tracing::{debug, error, info, warn};

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("html tag pattern is valid"));

/// Mirrors the catalogs of creators to disk.
///
/// Created through [`MirrorBuilder`](super::MirrorBuilder).
pub struct Mirror {
    config: MirrorConfig,
    client: ClientWithMiddleware,
    catalog: CatalogClient,
    planner: PathPlanner,
}

impl fmt::Debug for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("directory", &self.config.directory)
            .field("filter", &self.config.filter)
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl Mirror {
    pub(crate) fn new(config: MirrorConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", config.api_base, e))
        })?;
        let client = create_http_client(config.http.clone())?;
        let catalog = CatalogClient::new(
            client.clone(),
            api_base,
            config.token.clone(),
            config.nsfw,
            config.retry,
        );
        let planner = PathPlanner::new(
            config.directory.clone(),
            NameSanitizer::new(config.max_path_length),
        );

        Ok(Self {
            config,
            client,
            catalog,
            planner,
        })
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    /// `<logs>/<creator>.txt`
    pub fn summary_path(&self, creator: &str) -> PathBuf {
        let name = format!("{creator}.txt");
        self.config
            .logs_directory
            .join(self.planner.sanitizer().sanitize(&name))
    }

    /// `<logs>/failed_downloads_<creator>.txt`
    pub fn failure_log_path(&self, creator: &str) -> PathBuf {
        let name = format!("failed_downloads_{creator}.txt");
        self.config
            .logs_directory
            .join(self.planner.sanitizer().sanitize(&name))
    }

    /// Mirror every creator in turn.
    ///
    /// A creator that cannot be processed is logged and the next one is
    /// started anyway.
    pub async fn run(&self, creators: &[String]) -> Vec<(String, Result<RunSummary>)> {
        let mut results = Vec::with_capacity(creators.len());
        for creator in creators {
            let result = self.process_creator(creator).await;
            if let Err(e) = &result {
                error!(creator = %creator, "Aborted: {e}");
            }
            results.push((creator.clone(), result));
        }
        results
    }

    /// Survey, then download, everything `creator` published.
    pub async fn process_creator(&self, creator: &str) -> Result<RunSummary> {
        let filter = self.config.filter;
        info!(creator, %filter, "Processing creator");

        let survey = self.catalog.survey(creator).await?;
        let summary_path = self.summary_path(creator);
        report::write_summary(&summary_path, &survey).await?;
        let counts = report::read_summary(&summary_path).await?;
        let (selected, intentionally_skipped) = counts.selection(&filter);

        let failures = Arc::new(FailureLog::create(self.failure_log_path(creator), creator).await?);
        let engine = DownloadEngine::new(
            self.client.clone(),
            EngineConfig {
                retry: self.config.retry,
                min_weights_size: self.config.min_weights_size,
                token: self.config.token.clone(),
                nsfw: self.config.nsfw,
            },
            failures.clone(),
        );

        let mut tally = TaskTally::default();
        let mut pages = 0;
        let walk = self.catalog.pages(creator);
        futures::pin_mut!(walk);
        while let Some(page) = walk.try_next().await? {
            pages = page.number;
            let mut seen = HashSet::new();
            let mut tasks = Vec::new();
            for item in &page.items {
                if !seen.insert(item.name.as_str()) {
                    debug!(creator, item = %item.name, "Duplicate item name on page, skipping");
                    continue;
                }
                tasks.extend(self.plan_item(creator, item, &failures).await);
            }

            let progress = ProgressDisplay::new(
                self.config.style_options.clone(),
                tasks.len(),
                format!("{creator} - page {}", page.number),
            );
            let summaries = stream::iter(&tasks)
                .map(|task| engine.download(task, &progress))
                .buffer_unordered(self.config.concurrent_downloads)
                .collect::<Vec<_>>()
                .await;
            progress.finish();
            tally.record(&summaries);
            info!(creator, page = page.number, tasks = tasks.len(), "Page settled");
        }

        let creator_folder = self.planner.creator_folder(creator);
        let downloaded =
            report::count_on_disk(&creator_folder, &filter.selected_categories()).await?;
        let run = RunSummary {
            creator: creator.to_string(),
            filter,
            pages,
            total_items: counts.total,
            category_counts: counts.categories,
            selected,
            intentionally_skipped,
            downloaded,
            failed: selected.saturating_sub(downloaded),
            tasks: tally,
            failure_records: failures.len().await,
        };
        info!(
            creator,
            selected = run.selected,
            downloaded = run.downloaded,
            failed = run.failed,
            "Creator done"
        );
        Ok(run)
    }

    /// Tasks of every version of `item`.
    async fn plan_item(
        &self,
        creator: &str,
        item: &CatalogItem,
        failures: &FailureLog,
    ) -> Vec<DownloadTask> {
        let mut tasks = Vec::new();
        for version in &item.model_versions {
            tasks.extend(self.plan_version(creator, item, version, failures).await);
        }
        tasks
    }

    /// Plan one version: file tasks, sidecars and image tasks.
    ///
    /// Files are filtered one by one on their own category. Sidecars and
    /// images go next to the first accepted file and are left out entirely
    /// when no file was accepted. Folders that cannot be created and sidecars
    /// that cannot be written are recorded as failures; the rest of the
    /// version is still planned.
    async fn plan_version(
        &self,
        creator: &str,
        item: &CatalogItem,
        version: &ModelVersion,
        failures: &FailureLog,
    ) -> Vec<DownloadTask> {
        let mut tasks = Vec::new();
        let mut home: Option<VersionLayout> = None;

        for file in &version.files {
            let category = classify_file(item, file);
            if !self.config.filter.accepts(category) {
                debug!(item = %item.name, file = %file.name, %category, "Filtered out");
                continue;
            }
            if file.download_url.is_empty() {
                warn!(item = %item.name, file = %file.name, "File has no download url");
                continue;
            }

            let layout = self.planner.plan_layout(creator, item, version, category);
            if let Err(e) = fs::create_dir_all(&layout.version_folder).await {
                record_failure(failures, item, &item.page_url(), e.into()).await;
                continue;
            }
            let destination = self.planner.file_path(&layout, item, &file.name);
            let kind = PayloadKind::for_file(&file.name, category);
            match DownloadTask::try_new(&file.download_url, destination, kind, &item.name) {
                Ok(task) => tasks.push(task),
                Err(e) => record_failure(failures, item, &file.download_url, e).await,
            }
            home.get_or_insert(layout);
        }

        let Some(layout) = home else {
            return tasks;
        };
        if let Err(e) = self.write_sidecars(&layout, item, version).await {
            record_failure(failures, item, &item.page_url(), e).await;
            return tasks;
        }

        let mut images = Vec::new();
        for image in &version.images {
            if image.is_valid() {
                images.push(image);
            } else {
                let reason = Error::InvalidEntry(format!(
                    "image without id or url (id: {:?}, url: {:?})",
                    image.id, image.url
                ));
                record_failure(failures, item, &item.page_url(), reason).await;
            }
        }
        let mut images = images.into_iter();

        if let Some(preview) = images.next() {
            let destination = self.planner.preview_path(&layout, preview);
            match DownloadTask::try_new(&preview.url, destination, PayloadKind::Image, &item.name) {
                Ok(task) => tasks.push(task),
                Err(e) => record_failure(failures, item, &preview.url, e).await,
            }
        }
        let examples: Vec<_> = images
            .filter_map(|image| Some((image, self.planner.example_path(&layout, item, image)?)))
            .collect();
        if !examples.is_empty() {
            if let Err(e) = fs::create_dir_all(layout.examples_folder()).await {
                record_failure(failures, item, &item.page_url(), e.into()).await;
                return tasks;
            }
        }
        for (image, destination) in examples {
            match DownloadTask::try_new(&image.url, destination, PayloadKind::Image, &item.name) {
                Ok(task) => tasks.push(task),
                Err(e) => record_failure(failures, item, &image.url, e).await,
            }
        }

        tasks
    }

    async fn write_sidecars(
        &self,
        layout: &VersionLayout,
        item: &CatalogItem,
        version: &ModelVersion,
    ) -> Result<()> {
        let description = strip_html(&item.description);
        if !description.is_empty() {
            fs::write(self.planner.description_path(layout), description).await?;
        }
        if !version.trained_words.is_empty() {
            let words = version.trained_words.join("\n");
            fs::write(self.planner.trigger_words_path(layout), words).await?;
        }
        fs::write(self.planner.details_path(layout), details(item, version)).await?;

        let metadata = serde_json::to_string_pretty(&item.raw)?;
        fs::write(self.planner.metadata_path(layout, item), metadata).await?;
        Ok(())
    }
}

async fn record_failure(failures: &FailureLog, item: &CatalogItem, url: &str, e: Error) {
    warn!(item = %item.name, "{e}");
    let record = FailureRecord {
        item_name: item.name.clone(),
        url: url.to_string(),
        reason: e.to_string(),
    };
    if let Err(e) = failures.append(record).await {
        error!("Could not write to {}: {e}", failures.path().display());
    }
}

/// Text of an HTML fragment, tags removed.
fn strip_html(html: &str) -> String {
    HTML_TAG.replace_all(html, "").trim().to_string()
}

fn details(item: &CatalogItem, version: &ModelVersion) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Model URL: {}", item.page_url());
    let _ = writeln!(out, "Version: {}", version.name);
    if let Some(base_model) = &version.base_model {
        let _ = writeln!(out, "Base Model: {base_model}");
    }
    for file in &version.files {
        let _ = writeln!(out, "File: {} - {}", file.name, file.download_url);
    }
    for image in &version.images {
        let _ = writeln!(out, "Image: {}", image.url);
    }
    out
}
