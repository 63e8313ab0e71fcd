//! Statistics for a finished crawl
//!
//! This module provides functionality for summarizing a run from the
//! scheduler's lifetime counters and the final result entries.

use crate::crawler::SchedulerCounters;
use crate::output::ResultEntry;
use serde::Serialize;

/// Crawl statistics summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStatistics {
    /// Total number of jobs submitted, the root included
    pub jobs_submitted: u64,

    /// Jobs that delivered all of their results
    pub jobs_succeeded: u64,

    /// Jobs that did not deliver all of their results
    pub jobs_failed: u64,

    /// Number of discovered entries
    pub entries: u64,

    /// Entries whose language statistics were collected
    pub entries_with_stats: u64,
}

impl CrawlStatistics {
    /// Builds statistics from scheduler counters and the final entries
    ///
    /// # Arguments
    ///
    /// * `counters` - Lifetime totals of the scheduler that ran the crawl
    /// * `entries` - Result entries in discovery order
    pub fn collect(counters: SchedulerCounters, entries: &[ResultEntry]) -> Self {
        let with_stats = entries
            .iter()
            .filter(|entry| entry.extra.language_stats.is_some())
            .count();

        Self {
            jobs_submitted: counters.submitted,
            jobs_succeeded: counters.completed,
            jobs_failed: counters.failed,
            entries: entries.len() as u64,
            entries_with_stats: with_stats as u64,
        }
    }

    /// Share of entries that received language statistics, in percent
    pub fn coverage(&self) -> f64 {
        if self.entries == 0 {
            return 0.0;
        }
        (self.entries_with_stats as f64 / self.entries as f64) * 100.0
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// Stdout is reserved for the JSON result.
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `failures` - Number of failures recorded during the run
pub fn print_statistics(stats: &CrawlStatistics, failures: usize) {
    eprintln!("=== Crawl Statistics ===\n");

    eprintln!("Jobs:");
    eprintln!("  Submitted: {}", stats.jobs_submitted);
    eprintln!("  Succeeded: {}", stats.jobs_succeeded);
    eprintln!("  Failed: {}", stats.jobs_failed);
    eprintln!();

    eprintln!("Entries:");
    eprintln!("  Discovered: {}", stats.entries);
    eprintln!(
        "  With language stats: {} ({:.1}%)",
        stats.entries_with_stats,
        stats.coverage()
    );
    eprintln!();

    if failures > 0 {
        eprintln!("Failures recorded: {}", failures);
    }
}
