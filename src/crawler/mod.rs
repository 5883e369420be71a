//! Crawler module for discovery and page fetching
//!
//! This module contains the network-facing half of the pipeline:
//! - `fetcher`: the shared HTTP client and response classification
//! - `parser`: link extraction from HTML
//! - `render`: headless browser rendering behind the `Renderer` trait
//! - `scheduler`: the HTTP and render pools plus request pacing
//! - `discovery`: breadth-first link discovery
//! - `pipeline`: the adaptive HTTP-then-render fetch of every page
//! - `coordinator`: robots, sitemap, crawl and fetch for one site

mod coordinator;
mod discovery;
mod fetcher;
mod parser;
mod pipeline;
mod render;
mod scheduler;

pub use coordinator::{run_pipeline, Coordinator, Discovery, SOURCE_CRAWLED, SOURCE_HOMEPAGE};
pub use discovery::LinkDiscoveryCrawler;
pub use fetcher::{build_http_client, is_html_content_type, FetchResult, HttpFetcher};
pub use parser::{extract_links, resolve_link};
pub use pipeline::{AdaptivePageFetcher, ProgressCallback};
pub use render::{BrowserSession, ChromiumRenderer, Renderer, NAVIGATION_TIMEOUT};
pub use scheduler::{effective_delay, Scheduler};
