//! HTTP fetcher implementation
//!
//! This module is the network boundary of the crawler:
//! - The `Fetcher` trait opens a streaming byte source for a locator
//! - `ReqwestFetcher` implements it over reqwest, one client per proxy
//! - Connection failures and non-success statuses are classified into `FetchError`

use crate::config::HttpConfig;
use crate::proxy::Proxy;
use crate::FetchError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A streaming response body, chunk by chunk
pub type ByteStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// Opens streaming fetches
///
/// Implementations must return as soon as the response head is available and
/// must not buffer the body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Opens a fetch to `target`, through `proxy` when one is given
    async fn open(&self, target: &str, proxy: Option<&Proxy>) -> Result<ByteStream, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP settings
/// * `proxy` - Proxy every request through this descriptor, or connect directly when `None`
///
/// # Example
///
/// ```no_run
/// use gitfan::config::HttpConfig;
/// use gitfan::crawler::build_http_client;
/// use gitfan::proxy::Proxy;
///
/// let proxy = Proxy::new("89.42.133.58:8080");
/// let client = build_http_client(&HttpConfig::default(), Some(&proxy)).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig, proxy: Option<&Proxy>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.to_url())?);
    }

    builder.build()
}

/// reqwest-backed `Fetcher`
///
/// Clients are built lazily and cached per proxy so every job of a crawl
/// shares one connection pool.
pub struct ReqwestFetcher {
    settings: HttpConfig,
    clients: Mutex<HashMap<Option<Proxy>, Client>>,
}

impl ReqwestFetcher {
    pub fn new(settings: HttpConfig) -> Self {
        Self {
            settings,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client_for(&self, proxy: Option<&Proxy>) -> Result<Client, FetchError> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let key = proxy.cloned();

        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let client = build_http_client(&self.settings, proxy).map_err(|e| FetchError::InvalidProxy {
            proxy: proxy.map(|p| p.to_string()).unwrap_or_default(),
            message: e.to_string(),
        })?;
        clients.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn open(&self, target: &str, proxy: Option<&Proxy>) -> Result<ByteStream, FetchError> {
        let url = reqwest::Url::parse(target).map_err(|e| FetchError::InvalidUrl {
            url: target.to_string(),
            message: e.to_string(),
        })?;

        let client = self.client_for(proxy)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(target, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }

        tracing::trace!(
            "Response head for {}: {} ({:?} bytes announced)",
            target,
            status,
            response.content_length()
        );

        let url = target.to_string();
        let stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| FetchError::Stream {
                url: url.clone(),
                message: e.to_string(),
            })
        });

        Ok(stream.boxed())
    }
}

/// Maps a reqwest send error onto a fetch error
fn classify_error(target: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: target.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: target.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Stream {
            url: target.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_direct_client() {
        let client = build_http_client(&HttpConfig::default(), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_proxied_client() {
        let proxy = Proxy::new("127.0.0.1:3128");
        let client = build_http_client(&HttpConfig::default(), Some(&proxy));
        assert!(client.is_ok());
    }

    #[test]
    fn test_clients_are_cached_per_proxy() {
        let fetcher = ReqwestFetcher::new(HttpConfig::default());
        let proxy = Proxy::new("127.0.0.1:3128");

        fetcher.client_for(None).unwrap();
        fetcher.client_for(Some(&proxy)).unwrap();
        fetcher.client_for(Some(&proxy)).unwrap();

        assert_eq!(fetcher.clients.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_target_url() {
        let fetcher = ReqwestFetcher::new(HttpConfig::default());
        let result = fetcher.open("not a url", None).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused_is_connection_level() {
        let fetcher = ReqwestFetcher::new(HttpConfig::default());
        // Port 1 is reserved and nothing listens on it in test environments
        let result = fetcher.open("http://127.0.0.1:1/", None).await;
        let err = result.err().expect("fetch should fail");
        assert!(err.is_connection_level(), "unexpected error: {}", err);
    }
}
