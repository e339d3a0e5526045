//! Per-creator bookkeeping.
//!
//! The catalog survey is persisted as a small text summary and read back to
//! compute how many items the current filter selects. After the downloads, the
//! number of downloaded items is recounted from the category folders on disk.
//! The recount survives interrupted runs, but it is an approximation: anything
//! else living in those folders is counted too.

use super::config::CategoryFilter;
use crate::catalog::{Category, CatalogSurvey, DownloadType};
use crate::download::{Status, Summary};
use crate::error::Result;
use crate::layout::is_item_label;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::warn;

const TOTAL_PREFIX: &str = "Total - Count:";
const COUNT_SEPARATOR: &str = " - Count:";
const DETAILED_LISTING: &str = "Detailed Listing:";

/// Render the summary text of a survey.
pub fn render_summary(survey: &CatalogSurvey) -> String {
    let mut out = String::new();
    out.push_str("Summary:\n");
    let _ = writeln!(out, "{TOTAL_PREFIX} {}", survey.total());
    for category in Category::ALL {
        let _ = writeln!(out, "{category}{COUNT_SEPARATOR} {}", survey.count(category));
    }

    let _ = writeln!(out, "\n{DETAILED_LISTING}");
    for category in Category::ALL {
        let _ = writeln!(out, "{category}{COUNT_SEPARATOR} {}", survey.count(category));
        if category == Category::Other {
            for (name, kind) in survey.other_types() {
                let kind = kind.as_deref().unwrap_or("None");
                let _ = writeln!(out, "{category} - Item: {name} - Type: {kind}");
            }
        } else {
            for name in survey.names(category) {
                let _ = writeln!(out, "{category} - Item: {name}");
            }
        }
        out.push('\n');
    }
    out
}

/// Persist the survey summary at `path`.
pub async fn write_summary(path: &Path, survey: &CatalogSurvey) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    fs::write(path, render_summary(survey)).await?;
    Ok(())
}

/// Counts read back from a summary file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub total: usize,
    pub categories: BTreeMap<Category, usize>,
}

impl SummaryCounts {
    /// Parse the summary block of a summary text. The detailed listing is ignored.
    pub fn parse(text: &str) -> Self {
        let mut counts = SummaryCounts::default();
        for line in text.lines().map(str::trim) {
            if line == DETAILED_LISTING {
                break;
            }
            if let Some(total) = line.strip_prefix(TOTAL_PREFIX) {
                counts.total = total.trim().parse().unwrap_or_default();
            } else if let Some((name, count)) = line.split_once(COUNT_SEPARATOR) {
                if let (Ok(category), Ok(count)) = (name.trim().parse(), count.trim().parse()) {
                    counts.categories.insert(category, count);
                }
            }
        }
        counts
    }

    pub fn count(&self, category: Category) -> usize {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    /// Items selected by `filter` and items it intentionally skips.
    pub fn selection(&self, filter: &CategoryFilter) -> (usize, usize) {
        match filter {
            CategoryFilter::Include(DownloadType::All) => (self.total, 0),
            CategoryFilter::Include(DownloadType::Only(category)) => {
                let selected = self.count(*category);
                (selected, self.total.saturating_sub(selected))
            }
            CategoryFilter::Exclude(category) => {
                let excluded = self.count(*category);
                (self.total.saturating_sub(excluded), excluded)
            }
        }
    }
}

/// Read a summary file back. A missing file reads as all zeros.
pub async fn read_summary(path: &Path) -> Result<SummaryCounts> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(SummaryCounts::parse(&text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Summary file {} not found", path.display());
            Ok(SummaryCounts::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Count item entries in the selected category folders of a creator.
///
/// Entries directly below a category folder are counted, except base-model
/// folders, whose entries are counted instead.
pub async fn count_on_disk(creator_folder: &Path, categories: &[Category]) -> Result<usize> {
    let mut total = 0;
    for category in categories {
        let folder = creator_folder.join(category.as_str());
        let mut entries = match fs::read_dir(&folder).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let is_dir = entry.file_type().await?.is_dir();
            if is_dir && !is_item_label(&name.to_string_lossy()) {
                total += count_entries(&entry.path()).await?;
            } else {
                total += 1;
            }
        }
    }
    Ok(total)
}

async fn count_entries(folder: &Path) -> Result<usize> {
    let mut entries = fs::read_dir(folder).await?;
    let mut count = 0;
    while entries.next_entry().await?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// In-memory outcome of the download tasks of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskTally {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TaskTally {
    pub fn record(&mut self, summaries: &[Summary]) {
        for summary in summaries {
            match summary.status() {
                Status::Success => self.downloaded += 1,
                Status::Skipped(_) => self.skipped += 1,
                Status::Fail(_) => self.failed += 1,
                Status::NotStarted => {}
            }
        }
    }
}

/// Counters of one creator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub creator: String,
    pub filter: CategoryFilter,
    /// Catalog pages walked during the download phase.
    pub pages: usize,
    /// Items (plus training-data files) in the catalog survey.
    pub total_items: usize,
    pub category_counts: BTreeMap<Category, usize>,
    /// Items the filter selects.
    pub selected: usize,
    /// Items the filter leaves out on purpose.
    pub intentionally_skipped: usize,
    /// Item entries found on disk after the run.
    pub downloaded: usize,
    /// `selected - downloaded`, never negative.
    pub failed: usize,
    /// Per-task outcome of this run.
    pub tasks: TaskTally,
    /// Records appended to the failure log.
    pub failure_records: usize,
}
