//! Job scheduler with completion callbacks
//!
//! This module handles:
//! - Launching every submitted job on its own tokio task
//! - Global concurrency limiting via a semaphore (FIFO admission)
//! - Invoking each job's completion handler exactly once
//! - Tracking outstanding work so callers can wait for drain
//!
//! A completion handler may submit further jobs while it is still consuming
//! its own results. Such submissions never block, and the outstanding count
//! is raised before the submitting job is released, so the count cannot touch
//! zero while any job in the graph is still pending.

use crate::config::SchedulerConfig;
use crate::crawler::job::{Extractions, Runnable};
use crate::state::JobState;
use crate::{CrawlError, FetchError};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Semaphore};

/// What a completion handler receives: the job's result sequence, or the
/// error that kept it from starting
pub type JobOutcome = Result<Extractions, FetchError>;

/// Reacts to a job once its result sequence is available
#[async_trait]
pub trait CompletionHandler: Send + Sync + 'static {
    /// Called exactly once per submitted job
    ///
    /// The handler owns `outcome`; the job counts as outstanding until this
    /// method returns. Returning an error marks the job as failed, as does a
    /// job that could not start.
    async fn on_complete(
        &self,
        scheduler: &Scheduler,
        job_id: &str,
        outcome: JobOutcome,
    ) -> Result<(), FetchError>;
}

/// Point-in-time view of one outstanding job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: String,
    pub target: String,
    pub state: JobState,
}

/// Lifetime totals of a scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerCounters {
    /// Jobs accepted by `submit`
    pub submitted: u64,
    /// Jobs that started and whose handler returned `Ok`
    pub completed: u64,
    /// Jobs that failed to start, whose handler returned an error, or whose
    /// handler panicked
    pub failed: u64,
}

/// Scheduler-side record of a submitted job
struct JobRecord {
    id: String,
    target: String,
    state: JobState,
}

struct SchedulerInner {
    /// Concurrency permits; a job holds one from fetch until its handler returns
    permits: Arc<Semaphore>,

    max_concurrent: usize,

    /// Number of jobs whose handler has not returned yet
    outstanding: watch::Sender<usize>,

    records: Mutex<HashMap<u64, JobRecord>>,

    next_ticket: AtomicU64,
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Runs jobs concurrently and reports their completion
///
/// Cloning is cheap; every clone drives the same pool.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// Creates a scheduler from its configuration
    pub fn new(config: &SchedulerConfig) -> Self {
        Self::with_limit(config.max_concurrent_jobs)
    }

    /// Creates a scheduler running at most `max_concurrent` jobs at once
    ///
    /// A limit of zero is raised to one.
    pub fn with_limit(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let (outstanding, _) = watch::channel(0);

        Self {
            inner: Arc::new(SchedulerInner {
                permits: Arc::new(Semaphore::new(max_concurrent)),
                max_concurrent,
                outstanding,
                records: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(0),
                submitted: AtomicU64::new(0),
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
        }
    }

    /// Submits a job; `handler` is invoked once its result sequence is available
    ///
    /// Returns immediately. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// * `CrawlError::Contract` - The job has an empty identifier, or no runtime
    ///   is available. Nothing is launched in either case.
    pub fn submit<J: Runnable>(
        &self,
        job: J,
        handler: Arc<dyn CompletionHandler>,
    ) -> Result<(), CrawlError> {
        if job.id().trim().is_empty() {
            return Err(CrawlError::Contract(format!(
                "job for {} was submitted without an identifier",
                job.target()
            )));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            CrawlError::Contract(format!(
                "job {} was submitted outside a tokio runtime",
                job.id()
            ))
        })?;

        let ticket = self.register(job.id(), job.target());
        tracing::debug!("Submitted job {} for {}", job.id(), job.target());

        runtime.spawn(self.clone().execute(ticket, job, handler));
        Ok(())
    }

    /// Returns true while at least one submitted job's handler has not returned
    pub fn outstanding(&self) -> bool {
        self.outstanding_count() > 0
    }

    /// Returns the number of jobs whose handler has not returned
    pub fn outstanding_count(&self) -> usize {
        *self.inner.outstanding.borrow()
    }

    /// Waits until no job is outstanding
    ///
    /// Returns immediately when the scheduler is already idle. Jobs submitted
    /// by handlers while waiting are waited for as well.
    pub async fn wait_idle(&self) {
        let mut receiver = self.inner.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = receiver.wait_for(|count| *count == 0).await;
    }

    /// Returns the outstanding jobs and their states
    pub fn snapshot(&self) -> Vec<JobSnapshot> {
        let records = self.records();
        let mut tickets: Vec<&u64> = records.keys().collect();
        tickets.sort();

        tickets
            .into_iter()
            .filter_map(|ticket| records.get(ticket))
            .map(|record| JobSnapshot {
                id: record.id.clone(),
                target: record.target.clone(),
                state: record.state,
            })
            .collect()
    }

    /// Returns lifetime totals
    pub fn counters(&self) -> SchedulerCounters {
        SchedulerCounters {
            submitted: self.inner.submitted.load(Ordering::SeqCst),
            completed: self.inner.completed.load(Ordering::SeqCst),
            failed: self.inner.failed.load(Ordering::SeqCst),
        }
    }

    /// Returns the concurrency limit
    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    fn records(&self) -> MutexGuard<'_, HashMap<u64, JobRecord>> {
        self.inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, id: &str, target: &str) -> u64 {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst);

        self.records().insert(
            ticket,
            JobRecord {
                id: id.to_string(),
                target: target.to_string(),
                state: JobState::Queued,
            },
        );
        self.inner.submitted.fetch_add(1, Ordering::SeqCst);
        self.inner.outstanding.send_modify(|count| *count += 1);

        ticket
    }

    fn set_state(&self, ticket: u64, state: JobState) {
        if let Some(record) = self.records().get_mut(&ticket) {
            tracing::trace!("Job {}: {} -> {}", record.id, record.state, state);
            record.state = state;
        }
    }

    fn deregister(&self, ticket: u64, state: JobState) {
        let record = self.records().remove(&ticket);

        match state {
            JobState::Completed => self.inner.completed.fetch_add(1, Ordering::SeqCst),
            _ => self.inner.failed.fetch_add(1, Ordering::SeqCst),
        };

        if let Some(record) = record {
            tracing::debug!("Job {} finished: {}", record.id, state);
        }

        self.inner
            .outstanding
            .send_modify(|count| *count = count.saturating_sub(1));
    }

    /// Body of a job's execution unit
    async fn execute<J: Runnable>(
        self,
        ticket: u64,
        job: J,
        handler: Arc<dyn CompletionHandler>,
    ) {
        let mut guard = CompletionGuard::new(self.clone(), ticket, job.id());

        let Ok(_permit) = self.inner.permits.clone().acquire_owned().await else {
            tracing::error!("Scheduler closed before job {} could start", job.id());
            return;
        };

        self.set_state(ticket, JobState::Fetching);
        let outcome = job.run().await;

        let started = match &outcome {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Job {} could not start: {}", job.id(), e);
                false
            }
        };

        self.set_state(ticket, JobState::Streaming);
        let outcome = outcome.map(|matches| matches.fuse().boxed());
        let handled = handler.on_complete(&self, job.id(), outcome).await;

        if let (true, Err(e)) = (started, &handled) {
            tracing::debug!("Job {} did not deliver its results: {}", job.id(), e);
        }

        guard.finish(if started && handled.is_ok() {
            JobState::Completed
        } else {
            JobState::Failed
        });
    }
}

/// Deregisters a job when its execution unit ends, including by panic
///
/// A panicking handler unwinds into tokio, which then drops the task's future
/// and with it this guard, so the outstanding count still goes down.
struct CompletionGuard {
    scheduler: Scheduler,
    ticket: u64,
    job_id: String,
    state: Option<JobState>,
}

impl CompletionGuard {
    fn new(scheduler: Scheduler, ticket: u64, job_id: &str) -> Self {
        Self {
            scheduler,
            ticket,
            job_id: job_id.to_string(),
            state: None,
        }
    }

    fn finish(&mut self, state: JobState) {
        self.state = Some(state);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let state = self.state.take().unwrap_or_else(|| {
            tracing::error!(
                "Job {} ended before its completion handler returned",
                self.job_id
            );
            JobState::Failed
        });
        self.scheduler.deregister(self.ticket, state);
    }
}
