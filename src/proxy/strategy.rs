use crate::proxy::Proxy;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Picks the proxy a crawl will use
pub trait ProxyStrategy: Send + Sync {
    /// Returns one proxy from the pool, or `None` when the pool is empty
    fn select<'a>(&self, proxies: &'a [Proxy]) -> Option<&'a Proxy>;
}

/// Always the first proxy in the pool
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstProxy;

impl ProxyStrategy for FirstProxy {
    fn select<'a>(&self, proxies: &'a [Proxy]) -> Option<&'a Proxy> {
        proxies.first()
    }
}

/// Cycles through the pool, one step per selection
///
/// A crawl selects once, so rotation only shows when one instance is shared
/// across coordinators through `Coordinator::with_parts`. A fresh instance,
/// as built by `Coordinator::new`, always starts at the first proxy.
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProxyStrategy for RoundRobin {
    fn select<'a>(&self, proxies: &'a [Proxy]) -> Option<&'a Proxy> {
        if proxies.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % proxies.len();
        proxies.get(index)
    }
}

/// Uniformly random pick
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomProxy;

impl ProxyStrategy for RandomProxy {
    fn select<'a>(&self, proxies: &'a [Proxy]) -> Option<&'a Proxy> {
        if proxies.is_empty() {
            return None;
        }
        proxies.get(rand::random_range(0..proxies.len()))
    }
}

/// Strategy names accepted in the configuration file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyStrategyKind {
    First,
    /// Same pick as `First` for a single crawl; see [`RoundRobin`]
    RoundRobin,
    #[default]
    Random,
}

impl ProxyStrategyKind {
    /// Builds the strategy this kind names
    pub fn build(self) -> Box<dyn ProxyStrategy> {
        match self {
            Self::First => Box::new(FirstProxy),
            Self::RoundRobin => Box::new(RoundRobin::new()),
            Self::Random => Box::new(RandomProxy),
        }
    }
}
