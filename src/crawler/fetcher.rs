//! HTTP fetcher implementation
//!
//! This module handles all plain HTTP requests for discovery and extraction:
//! - Building the shared client with the configured user agent and timeouts
//! - Classifying page responses (status, content type, transport failures)
//! - Best-effort text fetches for robots.txt and sitemaps

use crate::config::{CrawlConfig, FetchConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Accept header sent with every request
const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 5;

/// Result of a page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// An HTML page was fetched
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// The response was not HTML
    ContentMismatch {
        /// HTTP status code
        status_code: u16,
        /// The actual Content-Type received (empty when absent)
        content_type: String,
    },

    /// The server answered with a 4xx or 5xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// No usable response (connection refused, timeout, body read failure, ...)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// HTTP status of the response; 0 when none was received
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success { status_code, .. }
            | Self::ContentMismatch { status_code, .. }
            | Self::HttpError { status_code } => *status_code,
            Self::NetworkError { .. } => 0,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value of the User-Agent header
/// * `timeout` - Whole-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Shared HTTP client for one pipeline job
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawl and fetch settings
    pub fn new(crawl: &CrawlConfig, fetch: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &fetch.user_agent,
            Duration::from_secs(crawl.timeout_seconds),
        )?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a page and classifies the response
    ///
    /// # Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | No response / body unreadable | `NetworkError` |
    /// | Status outside 2xx | `HttpError` |
    /// | Content-Type not HTML | `ContentMismatch` |
    /// | Otherwise | `Success` |
    pub async fn fetch_page(&self, url: &str) -> FetchResult {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return classify_transport_error(&e),
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            tracing::debug!("{} answered HTTP {}", url, status.as_u16());
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return FetchResult::ContentMismatch {
                status_code: status.as_u16(),
                content_type,
            };
        }

        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                content_type,
                body,
            },
            Err(e) => classify_transport_error(&e),
        }
    }

    /// Fetches a URL as text; non-2xx statuses are errors
    pub async fn fetch_text(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// Fetches a URL as text, returning `None` on any failure
    pub async fn fetch_text_safe(&self, url: &str) -> Option<String> {
        match self.fetch_text(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!("Fetch of {} failed: {}", url, e);
                None
            }
        }
    }
}

/// True for text/html and XHTML content types
pub fn is_html_content_type(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    lowered.contains("text/html") || lowered.contains("application/xhtml+xml")
}

fn classify_transport_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection failed".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
