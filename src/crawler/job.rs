//! Units of work accepted by the scheduler

use crate::crawler::fetcher::Fetcher;
use crate::crawler::matcher::MatchStream;
use crate::proxy::Proxy;
use crate::FetchError;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Lazy sequence of values produced by a running job
///
/// Handed to exactly one completion handler, which owns it; mid-stream
/// failures arrive as `Err` items.
pub type Extractions = BoxStream<'static, Result<String, FetchError>>;

/// Something the scheduler can run
#[async_trait]
pub trait Runnable: Send + Sync + 'static {
    /// Key passed to the completion handler; must not be empty
    fn id(&self) -> &str;

    /// Locator used in logs and failure reports
    fn target(&self) -> &str;

    /// Starts the work and returns its result sequence
    async fn run(&self) -> Result<Extractions, FetchError>;
}

/// Streaming fetch that extracts one pattern match per line
#[derive(Clone)]
pub struct Job {
    id: String,
    target: String,
    proxy: Option<Proxy>,
    pattern: Arc<Regex>,
    fetcher: Arc<dyn Fetcher>,
}

impl Job {
    /// Creates a job
    ///
    /// # Arguments
    ///
    /// * `id` - Key the completion handler receives
    /// * `target` - Locator to fetch
    /// * `proxy` - Proxy to fetch through; `None` connects directly
    /// * `pattern` - Single-capture-group pattern applied to each line
    /// * `fetcher` - Network primitive used to open the stream
    pub fn new(
        id: impl Into<String>,
        target: impl Into<String>,
        proxy: Option<Proxy>,
        pattern: Arc<Regex>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            proxy,
            pattern,
            fetcher,
        }
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("proxy", &self.proxy)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

#[async_trait]
impl Runnable for Job {
    fn id(&self) -> &str {
        &self.id
    }

    fn target(&self) -> &str {
        &self.target
    }

    async fn run(&self) -> Result<Extractions, FetchError> {
        tracing::debug!(
            "Parsing {} using pattern {} via proxy {}",
            self.target,
            self.pattern.as_str(),
            self.proxy
                .as_ref()
                .map(|p| p.as_str())
                .unwrap_or("<direct>")
        );

        let source = self.fetcher.open(&self.target, self.proxy.as_ref()).await?;
        Ok(MatchStream::new(source, self.pattern.clone(), self.target.clone()).boxed())
    }
}
