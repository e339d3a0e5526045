//! Outcome of a [`DownloadTask`].

use super::task::DownloadTask;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};

/// Download status enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Download failed with error message
    Fail(String),
    /// Download not yet started
    NotStarted,
    /// Nothing to do, with reason
    Skipped(String),
    /// Download completed successfully
    Success,
}

/// Represents a [`DownloadTask`] summary.
#[derive(Debug, Clone)]
pub struct Summary {
    task: DownloadTask,
    /// HTTP status of the last response, if any was received.
    statuscode: Option<StatusCode>,
    /// Where the payload ended up (or would have).
    path: PathBuf,
    /// Bytes written.
    size: u64,
    /// Attempts spent, 0 when no request was made.
    attempts: u32,
    status: Status,
}

impl Summary {
    pub fn new(task: DownloadTask) -> Self {
        let path = task.destination.clone();
        Self {
            task,
            statuscode: None,
            path,
            size: 0,
            attempts: 0,
            status: Status::NotStarted,
        }
    }

    /// Mark the summary as completed.
    pub fn success(self, statuscode: StatusCode, path: PathBuf, size: u64, attempts: u32) -> Self {
        Self {
            statuscode: Some(statuscode),
            path,
            size,
            attempts,
            status: Status::Success,
            ..self
        }
    }

    /// Mark the summary as failed with a message.
    pub fn fail(self, msg: impl std::fmt::Display, attempts: u32) -> Self {
        Self {
            status: Status::Fail(msg.to_string()),
            attempts,
            ..self
        }
    }

    /// Mark the summary as skipped with a message.
    pub fn skip(self, msg: impl std::fmt::Display, path: PathBuf) -> Self {
        Self {
            status: Status::Skipped(msg.to_string()),
            path,
            ..self
        }
    }

    pub fn task(&self) -> &DownloadTask {
        &self.task
    }

    pub fn statuscode(&self) -> Option<StatusCode> {
        self.statuscode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// `true` only when this call wrote the payload.
    pub fn succeeded(&self) -> bool {
        self.status == Status::Success
    }
}
