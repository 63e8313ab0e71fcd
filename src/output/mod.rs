//! Output module for crawl results and reports
//!
//! This module handles:
//! - The shared result table filled in by discovery and merge handlers
//! - Serializing the final entries as JSON
//! - Recording per-job failures and crawl statistics

mod report;
mod results;
pub mod stats;

pub use report::{CrawlReport, FailureLog, JobFailure};
pub use results::{Extra, LanguageStats, ResultEntry, ResultTable};
pub use stats::{print_statistics, CrawlStatistics};
