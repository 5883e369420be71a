//! Page records flowing through discovery and extraction

use crate::PageError;
use serde::{Deserialize, Serialize};

/// How a page was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSource {
    Sitemap,
    Crawl,
    Homepage,
}

impl PageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSource::Sitemap => "sitemap",
            PageSource::Crawl => "crawl",
            PageSource::Homepage => "homepage",
        }
    }
}

impl std::fmt::Display for PageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page selected for extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPage {
    /// Normalized URL
    pub url: String,
    pub source: PageSource,
    /// Link distance from the start URL; 0 for sitemap and homepage entries
    pub depth: u32,
}

impl DiscoveredPage {
    pub fn new(url: impl Into<String>, source: PageSource, depth: u32) -> Self {
        Self {
            url: url.into(),
            source,
            depth,
        }
    }
}

/// Metadata and markdown extracted from one page
///
/// When `error` is set, every content field is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_type: Option<String>,
    pub og_image: Option<String>,
    /// Cleaned markdown, at most 5000 characters
    pub content_text: String,
    /// True only when the content came from a browser render
    pub is_js_rendered: bool,
    /// HTTP status of the response used; 0 when none was received
    pub fetch_status: u16,
    pub error: Option<String>,
}

impl ExtractedPage {
    /// Builds a failed record carrying only the URL, status and reason
    pub fn failed(url: impl Into<String>, fetch_status: u16, error: &PageError) -> Self {
        Self {
            url: url.into(),
            fetch_status,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Output of a browser render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
    pub title: Option<String>,
    pub status: u16,
    pub error: Option<String>,
}

impl RenderedPage {
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
