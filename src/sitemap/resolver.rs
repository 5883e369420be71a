//! Sitemap resolution with index recursion and caching

use crate::cache::{load_cached, store_cached, Cache};
use crate::crawler::HttpFetcher;
use crate::sitemap::parser::parse_sitemap;
use crate::sitemap::{
    SitemapEntry, SitemapResolution, MAX_RECURSION_DEPTH, MAX_SITEMAP_ENTRIES, SITEMAP_CACHE_TTL,
};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Conventional sitemap locations tried after any robots.txt hints
const DEFAULT_SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml"];

/// Accumulates entries for one candidate, deduplicated and bounded
struct EntryCollector {
    entries: Vec<SitemapEntry>,
    seen_urls: HashSet<String>,
    visited_sitemaps: HashSet<String>,
    limit: usize,
}

impl EntryCollector {
    fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            seen_urls: HashSet::new(),
            visited_sitemaps: HashSet::new(),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.entries.len() >= self.limit
    }

    /// Adds an entry unless its URL was already seen
    fn push(&mut self, entry: SitemapEntry) {
        if !self.is_full() && self.seen_urls.insert(entry.url.clone()) {
            self.entries.push(entry);
        }
    }
}

/// Resolves sitemap entries for a site
pub struct SitemapResolver {
    fetcher: Arc<HttpFetcher>,
    cache: Option<Arc<dyn Cache>>,
    limit: usize,
}

impl SitemapResolver {
    pub fn new(fetcher: Arc<HttpFetcher>, cache: Option<Arc<dyn Cache>>) -> Self {
        Self {
            fetcher,
            cache,
            limit: MAX_SITEMAP_ENTRIES,
        }
    }

    /// Returns the candidate sitemap URLs in the order they are tried
    pub fn candidate_urls(base_url: &Url, hint_urls: &[String]) -> Vec<String> {
        let hints = hint_urls.iter().map(String::as_str);
        let defaults = DEFAULT_SITEMAP_PATHS.iter().copied();

        let mut candidates: Vec<String> = Vec::new();
        for raw in hints.chain(defaults) {
            if let Ok(url) = base_url.join(raw) {
                let url = url.to_string();
                if !candidates.contains(&url) {
                    candidates.push(url);
                }
            }
        }
        candidates
    }

    /// Resolves the sitemap for `base_url`
    ///
    /// # Algorithm
    ///
    /// 1. Return the cached resolution for `sitemap:{base_url}` if present
    /// 2. Try each candidate in order; the first yielding entries wins
    /// 3. Sitemap indexes are followed up to depth 3, stopping once 500
    ///    entries are collected
    /// 4. Cache the result for an hour
    ///
    /// Failures never propagate; an unresolvable site yields no entries.
    pub async fn resolve(&self, base_url: &Url, hint_urls: &[String]) -> SitemapResolution {
        let cache_key = format!("sitemap:{}", base_url);

        if let Some(cache) = &self.cache {
            if let Some(cached) = load_cached::<SitemapResolution>(cache.as_ref(), &cache_key) {
                tracing::debug!("Sitemap cache hit for {}", base_url);
                return cached;
            }
        }

        let resolution = self.resolve_uncached(base_url, hint_urls).await;

        if let Some(cache) = &self.cache {
            store_cached(cache.as_ref(), &cache_key, &resolution, SITEMAP_CACHE_TTL);
        }

        resolution
    }

    async fn resolve_uncached(&self, base_url: &Url, hint_urls: &[String]) -> SitemapResolution {
        for candidate in Self::candidate_urls(base_url, hint_urls) {
            tracing::debug!("Trying sitemap {}", candidate);

            let mut collector = EntryCollector::new(self.limit);
            self.collect(candidate.clone(), 0, &mut collector).await;

            if !collector.entries.is_empty() {
                tracing::info!(
                    "Sitemap {} yielded {} entries",
                    candidate,
                    collector.entries.len()
                );
                return SitemapResolution {
                    entries: collector.entries,
                    source: Some(candidate),
                };
            }
        }

        tracing::info!("No usable sitemap found for {}", base_url);
        SitemapResolution::default()
    }

    /// Fetches one sitemap document and recurses into index children
    fn collect<'a>(
        &'a self,
        sitemap_url: String,
        depth: usize,
        collector: &'a mut EntryCollector,
    ) -> BoxFuture<'a, ()> {
        async move {
            if depth >= MAX_RECURSION_DEPTH {
                tracing::warn!(
                    "Sitemap nesting limit reached, ignoring {}",
                    sitemap_url
                );
                return;
            }

            if !collector.visited_sitemaps.insert(sitemap_url.clone()) {
                return;
            }

            let Some(body) = self.fetcher.fetch_text_safe(&sitemap_url).await else {
                return;
            };

            let parsed = parse_sitemap(&body);
            for entry in parsed.entries {
                collector.push(entry);
            }

            for child in parsed.children {
                if collector.is_full() {
                    tracing::debug!("Sitemap entry limit reached at {}", sitemap_url);
                    break;
                }
                self.collect(child, depth + 1, collector).await;
            }
        }
        .boxed()
    }
}
