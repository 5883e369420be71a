//! Configuration module for Site-Digest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_digest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("site-digest.toml")).unwrap();
//! println!("Discovery will stop after {} URLs", config.crawl.max_urls);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, CacheConfig, Config, CrawlConfig, FetchConfig, RulesConfig,
    DEFAULT_CRAWLER_NAME, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
