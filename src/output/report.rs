//! Final crawl report and per-job failure log

use crate::output::{CrawlStatistics, ResultEntry};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// A job that did not deliver its results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub job_id: String,
    pub target: String,
    pub message: String,
}

/// Collects failures from concurrently running handlers
#[derive(Debug, Default)]
pub struct FailureLog {
    failures: Mutex<Vec<JobFailure>>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure and logs it at warn level
    pub fn record(&self, job_id: &str, target: &str, message: impl Into<String>) {
        let failure = JobFailure {
            job_id: job_id.to_string(),
            target: target.to_string(),
            message: message.into(),
        };
        tracing::warn!(
            "Job {} ({}) failed: {}",
            failure.job_id,
            failure.target,
            failure.message
        );

        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure);
    }

    pub fn len(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the failures out, in recording order
    pub fn snapshot(&self) -> Vec<JobFailure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Result entries in discovery order
    pub entries: Vec<ResultEntry>,

    /// Jobs that failed to start or whose stream broke
    pub failures: Vec<JobFailure>,

    pub statistics: CrawlStatistics,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Serializes the entries as a compact JSON array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Serializes the entries as an indented JSON array
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Writes the indented JSON array to `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Destination file; created or truncated
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The file was written
    /// * `Err(CrawlError)` - Serialization or the write failed
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut json = self.to_json_pretty()?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
