//! Streaming download engine.
//!
//! Each attempt goes `Start → HeadersReceived → Streaming → Complete`, or ends
//! with an [`Error`]. Retryable errors are tried again under the shared
//! [`RetryPolicy`]; the final failure of a task is written to the creator's
//! [`FailureLog`] exactly once.

use super::failure_log::{FailureLog, FailureRecord};
use super::summary::Summary;
use super::task::{DownloadTask, PayloadKind};
use crate::error::{Error, Result};
use crate::progress::ProgressDisplay;
use crate::retry::RetryPolicy;
use crate::utils::headers::{content_kind, corrected_path, get_content_length};
use crate::utils::query::{redacted, with_auth};

use futures::StreamExt;
use indicatif::ProgressBar;
use reqwest::{Response, StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs, fs::File, fs::OpenOptions, io::AsyncWriteExt};
use tracing::{debug, error, warn};

/// Smallest acceptable size of a [`PayloadKind::Weights`] payload: 4 MiB.
pub const MIN_WEIGHTS_SIZE: u64 = 4 * 1024 * 1024;

/// Settings of a [`DownloadEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub retry: RetryPolicy,
    /// Weights smaller than this are treated as truncated.
    pub min_weights_size: u64,
    /// API token appended to every download URL.
    pub token: String,
    pub nsfw: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            min_weights_size: MIN_WEIGHTS_SIZE,
            token: String::new(),
            nsfw: true,
        }
    }
}

/// Result of one successful attempt.
enum Fetched {
    Written {
        path: PathBuf,
        size: u64,
        status: StatusCode,
        attempt: u32,
    },
    /// Another writer created the destination first.
    AlreadyPresent(PathBuf),
}

/// Downloads tasks to disk for a single creator run.
#[derive(Clone)]
pub struct DownloadEngine {
    client: ClientWithMiddleware,
    config: EngineConfig,
    failures: Arc<FailureLog>,
}

impl fmt::Debug for DownloadEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadEngine")
            .field("retry", &self.config.retry)
            .field("min_weights_size", &self.config.min_weights_size)
            .field("failures", &self.failures)
            .finish()
    }
}

impl DownloadEngine {
    pub fn new(client: ClientWithMiddleware, config: EngineConfig, failures: Arc<FailureLog>) -> Self {
        Self {
            client,
            config,
            failures,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn failure_log(&self) -> &Arc<FailureLog> {
        &self.failures
    }

    /// Fetch `task` to disk.
    ///
    /// Returns a skipped summary without touching the network when the
    /// destination already exists. Never returns an error: failures end up in
    /// the summary and in the failure log.
    pub async fn download(&self, task: &DownloadTask, progress: &ProgressDisplay) -> Summary {
        let summary = Summary::new(task.clone());

        if let Some(existing) = task.existing_destination() {
            debug!("{} already exists, skipping", existing.display());
            progress.increment_main();
            return summary.skip("file already exists", existing);
        }

        let url = with_auth(&task.source_url, &self.config.token, self.config.nsfw);
        let result = self
            .config
            .retry
            .run("Download", |attempt| self.attempt(task, &url, progress, attempt))
            .await;
        progress.increment_main();

        match result {
            Ok(Fetched::Written {
                path,
                size,
                status,
                attempt,
            }) => {
                debug!("Downloaded {} ({size} bytes)", path.display());
                summary.success(status, path, size, attempt)
            }
            Ok(Fetched::AlreadyPresent(path)) => {
                debug!("{} was written by another task, skipping", path.display());
                summary.skip("file already exists", path)
            }
            Err(exhausted) => {
                let reason = match &exhausted.error {
                    e if e.is_retryable() => {
                        format!("{e} (after {} attempts)", exhausted.attempts)
                    }
                    e => e.to_string(),
                };
                error!(
                    item = %task.item_name,
                    "Failed to download {}: {reason}",
                    task.source_url
                );
                let record = FailureRecord {
                    item_name: task.item_name.clone(),
                    url: task.source_url.to_string(),
                    reason: reason.clone(),
                };
                if let Err(e) = self.failures.append(record).await {
                    error!("Could not write to {}: {e}", self.failures.path().display());
                }
                summary.fail(reason, exhausted.attempts)
            }
        }
    }

    async fn attempt(
        &self,
        task: &DownloadTask,
        url: &Url,
        progress: &ProgressDisplay,
        attempt: u32,
    ) -> Result<Fetched> {
        debug!(attempt, "Fetching {}", redacted(url));
        let res = self.client.get(url.clone()).send().await?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(task.source_url.to_string()));
        }
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status,
                url: task.source_url.to_string(),
            });
        }

        let output = corrected_path(&task.destination, content_kind(&res));
        if let Some(dir) = output.parent() {
            fs::create_dir_all(dir).await?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&output)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Ok(Fetched::AlreadyPresent(output));
            }
            Err(e) => return Err(e.into()),
        };

        let pb = progress.create_child_progress(get_content_length(&res), &task.file_name());
        let streamed = stream_to_file(res, &mut file, &pb).await;
        progress.finish_child(pb);
        drop(file);

        let size = match streamed {
            Ok(size) => size,
            Err(e) => {
                remove_partial(&output).await;
                return Err(e);
            }
        };

        if task.kind == PayloadKind::Weights && size < self.config.min_weights_size {
            warn!(
                "{} is smaller than expected ({size} bytes), discarding",
                output.display()
            );
            remove_partial(&output).await;
            return Err(Error::UndersizedPayload {
                path: output,
                size,
                minimum: self.config.min_weights_size,
            });
        }

        Ok(Fetched::Written {
            path: output,
            size,
            status,
            attempt,
        })
    }
}

/// Write the body chunk by chunk, returning the bytes written.
async fn stream_to_file(res: Response, file: &mut File, pb: &ProgressBar) -> Result<u64> {
    let mut written: u64 = 0;
    let mut stream = res.bytes_stream();
    while let Some(item) = stream.next().await {
        let mut chunk = item?;
        let chunk_size = chunk.len() as u64;
        file.write_all_buf(&mut chunk).await?;
        written += chunk_size;
        pb.inc(chunk_size);
    }
    file.flush().await?;
    Ok(written)
}

async fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove partial file {}: {e}", path.display());
        }
    }
}
