//! In-memory fetcher used by unit tests

use crate::crawler::fetcher::{ByteStream, Fetcher};
use crate::proxy::Proxy;
use crate::FetchError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

type OpenLog = Arc<Mutex<Vec<(String, Option<Proxy>)>>>;

#[derive(Clone, Default)]
struct Page {
    chunks: Vec<Bytes>,
    refused: bool,
    broken: bool,
    open_delay: Duration,
    chunk_delay: Duration,
    /// Chunks after the first wait until this target has been opened
    release_after: Option<String>,
}

/// Serves canned bodies keyed by target; unknown targets answer 404
#[derive(Default)]
pub(crate) struct MemoryFetcher {
    pages: HashMap<String, Page>,
    opened: OpenLog,
    open_events: Arc<Notify>,
}

impl MemoryFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serves `body` as a single chunk
    pub(crate) fn page(self, target: &str, body: &str) -> Self {
        self.chunked(target, vec![body.to_string()])
    }

    /// Serves each string as a separate chunk
    pub(crate) fn chunked(mut self, target: &str, chunks: Vec<String>) -> Self {
        self.pages.insert(
            target.to_string(),
            Page {
                chunks: chunks.into_iter().map(Bytes::from).collect(),
                ..Page::default()
            },
        );
        self
    }

    /// Serves one line per chunk, pausing `delay` before each chunk
    pub(crate) fn trickle(mut self, target: &str, lines: &[&str], delay: Duration) -> Self {
        self.pages.insert(
            target.to_string(),
            Page {
                chunks: lines
                    .iter()
                    .map(|line| Bytes::from(format!("{}\n", line)))
                    .collect(),
                chunk_delay: delay,
                ..Page::default()
            },
        );
        self
    }

    /// Serves one line per chunk, holding back every line after the first
    /// until `release_after` has been opened
    pub(crate) fn held(mut self, target: &str, lines: &[&str], release_after: &str) -> Self {
        self.pages.insert(
            target.to_string(),
            Page {
                chunks: lines
                    .iter()
                    .map(|line| Bytes::from(format!("{}\n", line)))
                    .collect(),
                release_after: Some(release_after.to_string()),
                ..Page::default()
            },
        );
        self
    }

    /// Waits `delay` before answering with `body`
    pub(crate) fn slow(mut self, target: &str, body: &str, delay: Duration) -> Self {
        self.pages.insert(
            target.to_string(),
            Page {
                chunks: vec![Bytes::from(body.to_string())],
                open_delay: delay,
                ..Page::default()
            },
        );
        self
    }

    /// Fails the open with a connection error
    pub(crate) fn refuse(mut self, target: &str) -> Self {
        self.pages.insert(
            target.to_string(),
            Page {
                refused: true,
                ..Page::default()
            },
        );
        self
    }

    /// Serves `body`, then fails the stream as if the peer disconnected
    pub(crate) fn break_after(mut self, target: &str, body: &str) -> Self {
        self.pages.insert(
            target.to_string(),
            Page {
                chunks: vec![Bytes::from(body.to_string())],
                broken: true,
                ..Page::default()
            },
        );
        self
    }

    /// Every open so far, in call order
    pub(crate) fn opened(&self) -> Vec<(String, Option<Proxy>)> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn open(&self, target: &str, proxy: Option<&Proxy>) -> Result<ByteStream, FetchError> {
        self.opened
            .lock()
            .unwrap()
            .push((target.to_string(), proxy.cloned()));
        self.open_events.notify_waiters();

        let page = self.pages.get(target).cloned().ok_or_else(|| FetchError::Status {
            url: target.to_string(),
            status: 404,
        })?;

        if !page.open_delay.is_zero() {
            tokio::time::sleep(page.open_delay).await;
        }

        if page.refused {
            return Err(FetchError::Connect {
                url: target.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let delay = page.chunk_delay;
        let gate = page
            .release_after
            .map(|release| (release, self.opened.clone(), self.open_events.clone()));
        let body = stream::iter(page.chunks.into_iter().enumerate()).then(move |(index, chunk)| {
            let gate = gate.clone();
            async move {
                if let Some((release, opened, events)) = gate.filter(|_| index > 0) {
                    wait_until_opened(&release, &opened, &events).await;
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<Bytes, FetchError>(chunk)
            }
        });

        if page.broken {
            let url = target.to_string();
            let tail = stream::once(async move {
                Err(FetchError::Stream {
                    url,
                    message: "connection reset by peer".to_string(),
                })
            });
            Ok(body.chain(tail).boxed())
        } else {
            Ok(body.boxed())
        }
    }
}

async fn wait_until_opened(target: &str, opened: &OpenLog, events: &Notify) {
    loop {
        let notified = events.notified();
        let released = opened.lock().unwrap().iter().any(|(t, _)| t == target);
        if released {
            return;
        }
        notified.await;
    }
}
