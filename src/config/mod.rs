//! Configuration module for Gitfan
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use gitfan::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gitfan.toml")).unwrap();
//! println!("Searching {} for {:?}", config.search.category, config.search.keywords);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, HttpConfig, ProxyConfig, SchedulerConfig, SearchConfig, DEFAULT_BASE_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
