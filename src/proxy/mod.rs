//! Proxy descriptors and selection policies
//!
//! A crawl fixes one proxy for its whole lifetime. Which one is decided by a
//! [`ProxyStrategy`] injected into the coordinator.

mod strategy;

pub use strategy::{FirstProxy, ProxyStrategy, ProxyStrategyKind, RandomProxy, RoundRobin};

use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use url::Url;

/// A proxy descriptor such as `89.42.133.58:8080` or `http://proxy.local:3128`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Proxy(String);

impl Proxy {
    /// Creates a proxy descriptor without validating it
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self(descriptor.into())
    }

    /// Returns the descriptor as written in the configuration
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the descriptor as a proxy URL
    ///
    /// Bare `host:port` descriptors are treated as plain HTTP proxies.
    pub fn to_url(&self) -> String {
        if self.0.contains("://") {
            self.0.clone()
        } else {
            format!("http://{}", self.0)
        }
    }

    /// Checks that the descriptor parses as a proxy URL with a host
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.0.trim().is_empty() {
            return Err(ConfigError::InvalidProxy(
                "proxy descriptor cannot be empty".to_string(),
            ));
        }

        let url = Url::parse(&self.to_url())
            .map_err(|e| ConfigError::InvalidProxy(format!("'{}': {}", self.0, e)))?;

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidProxy(format!(
                "'{}' has no host",
                self.0
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
