//! Crawler module for job dispatch and streaming extraction
//!
//! This module contains the core crawling logic, including:
//! - Streaming HTTP fetches through an optional proxy
//! - Line-by-line pattern extraction over the response body
//! - Concurrent job scheduling with completion handlers
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod job;
mod matcher;
mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{Coordinator, ROOT_JOB_ID};
pub use fetcher::{build_http_client, ByteStream, Fetcher, ReqwestFetcher};
pub use job::{Extractions, Job, Runnable};
pub use matcher::MatchStream;
pub use scheduler::{CompletionHandler, JobOutcome, JobSnapshot, Scheduler, SchedulerCounters};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and pick the proxy
/// 2. Fetch the search page and stream its matches
/// 3. Fetch every discovered repository page concurrently
/// 4. Merge language statistics into the result table
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed; per-job failures are in the report
/// * `Err(CrawlError)` - The configuration is invalid
pub async fn crawl(config: Config) -> Result<CrawlReport> {
    Coordinator::new(config)?.run().await
}
