//! Gitfan: a fan-out crawler for GitHub search results
//!
//! This crate runs a streaming search fetch, extracts repository paths line by
//! line, and spawns one follow-up job per discovered repository to collect its
//! language statistics. All jobs run concurrently on a bounded scheduler and
//! their results are merged into a shared result table.

pub mod config;
pub mod crawler;
pub mod output;
pub mod proxy;
pub mod search;
pub mod state;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Contract violation: {0}")]
    Contract(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown search category '{0}' (expected Repositories, Issues or Wikis)")]
    UnknownCategory(String),

    #[error("Invalid proxy descriptor: {0}")]
    InvalidProxy(String),
}

/// Errors raised by the network fetch primitive or while reading its stream
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Invalid target URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Invalid proxy {proxy}: {message}")]
    InvalidProxy { proxy: String, message: String },

    #[error("Connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Stream from {url} interrupted: {message}")]
    Stream { url: String, message: String },

    #[error("Response line from {url} is not valid UTF-8")]
    Decode { url: String },
}

impl FetchError {
    /// Returns the URL the failing fetch targeted
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::Connect { url, .. }
            | Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Stream { url, .. }
            | Self::Decode { url } => url,
            Self::InvalidProxy { proxy, .. } => proxy,
        }
    }

    /// Returns true if the failure happened before any response byte arrived
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Timeout { .. } | Self::InvalidProxy { .. }
        )
    }
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Job, Runnable, Scheduler};
pub use output::{CrawlReport, JobFailure, ResultEntry};
pub use search::SearchCategory;
pub use state::JobState;
