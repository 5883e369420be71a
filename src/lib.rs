//! Site-Digest: website discovery and adaptive content extraction
//!
//! This crate discovers the pages of a website (robots.txt, sitemaps and a
//! bounded breadth-first link crawl) and turns each page into normalized
//! metadata plus bounded markdown. Pages that only render client-side are
//! re-fetched through a headless browser.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod page;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Digest operations
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("Invalid state transition for {url}: {from:?} -> {to:?}")]
    InvalidTransition {
        url: String,
        from: state::PageState,
        to: state::PageState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Why a single page produced no usable content
///
/// These never abort a job; they are folded into the page's `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Non-HTML content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    #[error("Soft 404 detected: {signal}")]
    SoftNotFound { signal: String },

    #[error("Render failed: {0}")]
    Render(String),
}

/// Result type alias for Site-Digest operations
pub type Result<T> = std::result::Result<T, DigestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use page::{DiscoveredPage, ExtractedPage, PageSource, RenderedPage};
pub use state::PageState;
pub use url::{is_same_site, normalize_url};
