use crate::proxy::{Proxy, ProxyStrategyKind};
use crate::search::SearchCategory;
use serde::Deserialize;

/// Default site the search and repository locators are composed against
pub const DEFAULT_BASE_URL: &str = "https://github.com";

/// Main configuration structure for a crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// What to search for
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Search keywords, joined with `+` in the query string
    pub keywords: Vec<String>,

    /// Which result listing to scan
    pub category: SearchCategory,

    /// Site root used for both the search page and repository pages
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

/// Proxy pool and the policy used to pick one proxy per run
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Proxy descriptors such as `89.42.133.58:8080`
    pub proxies: Vec<Proxy>,

    /// Selection policy
    #[serde(default)]
    pub strategy: ProxyStrategyKind,
}

/// Job scheduler limits
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of jobs fetching at the same time
    #[serde(rename = "max-concurrent-jobs", default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// How often the coordinator logs progress while waiting for drain (milliseconds)
    #[serde(rename = "progress-interval-ms", default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_concurrent_jobs() -> usize {
    16
}

fn default_progress_interval_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("gitfan/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout_secs() -> u64 {
    10
}
