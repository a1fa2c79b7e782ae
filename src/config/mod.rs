//! Configuration module for Sumi-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling up to {} sites at once", config.crawler.max_concurrent_sites);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FilterConfig, ListingsConfig, OutputConfig, UserAgentConfig,
    DEFAULT_BLACKLIST_DOMAINS, DEFAULT_BLACKLIST_EXTENSIONS, DEFAULT_KEYWORDS,
    DEFAULT_REDIRECT_PATTERNS, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
