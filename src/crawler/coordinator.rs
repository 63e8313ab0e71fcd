//! Crawler coordinator - search fan-out orchestration
//!
//! This module drives a complete crawl:
//! - Fixing one proxy for the whole run
//! - Submitting the root search job
//! - Fanning out one repository job per discovered match, while the search
//!   page is still streaming
//! - Merging each repository's language statistics into the result table
//! - Waiting for the job graph to drain and assembling the report

use crate::config::{validate, Config};
use crate::crawler::fetcher::{Fetcher, ReqwestFetcher};
use crate::crawler::job::Job;
use crate::crawler::scheduler::{CompletionHandler, JobOutcome, Scheduler};
use crate::output::{
    CrawlReport, CrawlStatistics, FailureLog, LanguageStats, ResultEntry, ResultTable,
};
use crate::proxy::{Proxy, ProxyStrategy};
use crate::search::{owner_of, repository_url, search_url, SearchCategory, LANGUAGE_STATS_PATTERN};
use crate::{ConfigError, FetchError, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::{StreamExt, TryStreamExt};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// Identifier of the search job
pub const ROOT_JOB_ID: &str = "root";

/// State shared by every handler of one crawl
struct CrawlContext {
    base_url: String,
    proxy: Option<Proxy>,
    language_pattern: Arc<Regex>,
    fetcher: Arc<dyn Fetcher>,
    results: ResultTable,
    failures: FailureLog,
}

impl CrawlContext {
    fn record_failure(&self, job_id: &str, error: &FetchError) {
        self.failures.record(job_id, error.url(), error.to_string());
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<CrawlContext>,
    scheduler: Scheduler,
    category: SearchCategory,
    search_target: String,
    search_pattern: Arc<Regex>,
    progress_interval: Duration,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// The proxy is chosen with a fresh instance of the strategy named in the
    /// configuration. Use `with_parts` to share one strategy between runs.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - The configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = Arc::new(ReqwestFetcher::new(config.http.clone()));
        let strategy = config.proxy.strategy.build();
        Self::with_parts(config, fetcher, strategy.as_ref())
    }

    /// Creates a coordinator from explicit collaborators
    ///
    /// Validation happens here, before any job exists, so an invalid
    /// configuration never reaches the network.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Network primitive shared by every job
    /// * `strategy` - Picks the proxy used for the whole run
    pub fn with_parts(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        strategy: &dyn ProxyStrategy,
    ) -> Result<Self> {
        validate(&config)?;

        let proxy = strategy
            .select(&config.proxy.proxies)
            .cloned()
            .ok_or_else(|| {
                ConfigError::Validation("proxies must contain at least one entry".to_string())
            })?;

        let category = config.search.category;
        let search_pattern = Arc::new(Regex::new(category.pattern())?);
        let language_pattern = Arc::new(Regex::new(LANGUAGE_STATS_PATTERN)?);
        let search_target = search_url(&config.search.base_url, &config.search.keywords, category);

        Ok(Self {
            context: Arc::new(CrawlContext {
                base_url: config.search.base_url.clone(),
                proxy: Some(proxy),
                language_pattern,
                fetcher,
                results: ResultTable::new(),
                failures: FailureLog::new(),
            }),
            scheduler: Scheduler::new(&config.scheduler),
            category,
            search_target,
            search_pattern,
            progress_interval: Duration::from_millis(config.scheduler.progress_interval_ms),
        })
    }

    /// Locator of the search page
    pub fn search_target(&self) -> &str {
        &self.search_target
    }

    pub fn category(&self) -> SearchCategory {
        self.category
    }

    /// Pattern applied to the search page
    pub fn search_pattern(&self) -> &str {
        self.search_pattern.as_str()
    }

    /// Proxy every job of this run goes through
    pub fn proxy(&self) -> Option<&Proxy> {
        self.context.proxy.as_ref()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs the crawl to completion
    ///
    /// Returns once every job, including repository jobs submitted while the
    /// search page was still streaming, has had its handler return. Per-job
    /// failures end up in the report rather than as an error.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Entries in discovery order plus failures
    /// * `Err(CrawlError)` - The search job could not be submitted
    pub async fn run(self) -> Result<CrawlReport> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting {} search: {}",
            self.category,
            self.search_target
        );

        let merge: Arc<dyn CompletionHandler> = Arc::new(MergeHandler {
            context: self.context.clone(),
        });
        let discovery = Arc::new(DiscoveryHandler {
            context: self.context.clone(),
            merge,
        });

        let root = Job::new(
            ROOT_JOB_ID,
            self.search_target.clone(),
            self.context.proxy.clone(),
            self.search_pattern.clone(),
            self.context.fetcher.clone(),
        );
        self.scheduler.submit(root, discovery)?;

        self.wait_for_drain().await;

        let entries = self.context.results.entries();
        let failures = self.context.failures.snapshot();
        let statistics = CrawlStatistics::collect(self.scheduler.counters(), &entries);
        let finished_at = Utc::now();

        tracing::info!(
            "Crawl completed: {} entries, {} failures in {}ms",
            entries.len(),
            failures.len(),
            (finished_at - started_at).num_milliseconds()
        );

        Ok(CrawlReport {
            entries,
            failures,
            statistics,
            started_at,
            finished_at,
        })
    }

    /// Blocks until the scheduler is idle, logging progress on every tick
    async fn wait_for_drain(&self) {
        loop {
            let idle = tokio::time::timeout(self.progress_interval, self.scheduler.wait_idle());
            if idle.await.is_ok() {
                return;
            }
            self.log_progress();
        }
    }

    fn log_progress(&self) {
        let snapshot = self.scheduler.snapshot();
        let running = snapshot
            .iter()
            .filter(|job| job.state.holds_permit())
            .count();

        tracing::info!(
            "Progress: {} entries, {} jobs running, {} queued",
            self.context.results.len(),
            running,
            snapshot.len() - running
        );
    }
}

/// Fans out one repository job per match of the search page
struct DiscoveryHandler {
    context: Arc<CrawlContext>,
    merge: Arc<dyn CompletionHandler>,
}

#[async_trait]
impl CompletionHandler for DiscoveryHandler {
    async fn on_complete(
        &self,
        scheduler: &Scheduler,
        job_id: &str,
        outcome: JobOutcome,
    ) -> std::result::Result<(), FetchError> {
        let context = &self.context;
        let mut matches = match outcome {
            Ok(matches) => matches,
            Err(e) => {
                context.record_failure(job_id, &e);
                return Err(e);
            }
        };

        let mut discovered = 0usize;
        let mut interrupted = None;
        while let Some(item) = matches.next().await {
            let key = match item {
                Ok(key) => key,
                Err(e) => {
                    context.record_failure(job_id, &e);
                    interrupted = Some(e);
                    break;
                }
            };

            let url = repository_url(&context.base_url, &key);
            let entry = ResultEntry::new(url.clone(), owner_of(&key));
            if !context.results.insert_if_absent(&key, entry) {
                tracing::debug!("Skipping duplicate match {}", key);
                continue;
            }
            discovered += 1;

            let child = Job::new(
                key.clone(),
                url.clone(),
                context.proxy.clone(),
                context.language_pattern.clone(),
                context.fetcher.clone(),
            );
            if let Err(e) = scheduler.submit(child, self.merge.clone()) {
                context.failures.record(&key, &url, e.to_string());
            }
        }

        tracing::info!("Discovered {} entries from job {}", discovered, job_id);
        interrupted.map_or(Ok(()), Err)
    }
}

/// Folds a repository job's language statistics into its entry
struct MergeHandler {
    context: Arc<CrawlContext>,
}

#[async_trait]
impl CompletionHandler for MergeHandler {
    async fn on_complete(
        &self,
        _scheduler: &Scheduler,
        job_id: &str,
        outcome: JobOutcome,
    ) -> std::result::Result<(), FetchError> {
        let context = &self.context;

        let collected = match outcome {
            Ok(matches) => matches.try_collect::<Vec<String>>().await,
            Err(e) => Err(e),
        };
        let values = collected.inspect_err(|e| context.record_failure(job_id, e))?;

        let stats = LanguageStats::from_flat(values);
        tracing::debug!("Collected {} languages for {}", stats.len(), job_id);

        if !context.results.merge_language_stats(job_id, stats) {
            tracing::warn!("No result entry for job {}", job_id);
        }
        Ok(())
    }
}
