//! Per-creator failure log.
//!
//! Workers finish concurrently, so every record is written in one piece while
//! holding the log's lock. Records are only ever appended.

use crate::error::Result;

use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// A payload that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub item_name: String,
    /// Source URL, without credentials.
    pub url: String,
    pub reason: String,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Item Name: {}", self.item_name)?;
        writeln!(f, "URL: {}", self.url)?;
        writeln!(f, "Reason: {}", self.reason)?;
        writeln!(f, "---")
    }
}

struct Inner {
    file: File,
    records: Vec<FailureRecord>,
}

/// Append-only failure log shared by every worker of a creator run.
pub struct FailureLog {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl fmt::Debug for FailureLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureLog").field("path", &self.path).finish()
    }
}

impl FailureLog {
    /// Start a fresh log for `creator` at `path`, replacing any previous one.
    pub async fn create(path: impl Into<PathBuf>, creator: &str) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        fs::write(&path, format!("Failed Downloads for Username: {creator}\n\n")).await?;
        let file = OpenOptions::new().append(true).open(&path).await?;
        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file,
                records: Vec::new(),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub async fn append(&self, record: FailureRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.file.write_all(record.to_string().as_bytes()).await?;
        inner.file.flush().await?;
        inner.records.push(record);
        Ok(())
    }

    /// Records appended during this run.
    pub async fn records(&self) -> Vec<FailureRecord> {
        self.inner.lock().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
