//! Sitemap discovery module
//!
//! Resolves a site's sitemap (from robots.txt hints or the conventional
//! locations) into a bounded, deduplicated list of page URLs.

mod parser;
mod resolver;

pub use parser::{parse_sitemap, ParsedSitemap};
pub use resolver::SitemapResolver;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of entries returned from one resolution
pub const MAX_SITEMAP_ENTRIES: usize = 500;

/// Sitemap index nesting below this depth is ignored
pub const MAX_RECURSION_DEPTH: usize = 3;

/// How long a resolution stays cached
pub const SITEMAP_CACHE_TTL: Duration = Duration::from_secs(3600);

/// One page listed in a sitemap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    /// Normalized page URL
    pub url: String,
    pub lastmod: Option<DateTime<FixedOffset>>,
    pub priority: Option<f32>,
}

/// Result of resolving a site's sitemaps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitemapResolution {
    /// At most 500 entries, first occurrence wins
    pub entries: Vec<SitemapEntry>,
    /// The sitemap URL that produced the entries; `None` if nothing was found
    pub source: Option<String>,
}

impl SitemapResolution {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
