//! Pipeline coordinator
//!
//! Ties discovery and extraction together for one start URL:
//! robots.txt, then sitemaps, then a link crawl if no sitemap lists any
//! page, and finally the adaptive fetch of every discovered page.

use crate::cache::{Cache, SqliteCache};
use crate::config::{validate, Config};
use crate::crawler::discovery::LinkDiscoveryCrawler;
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::pipeline::{AdaptivePageFetcher, ProgressCallback};
use crate::crawler::render::{ChromiumRenderer, Renderer};
use crate::crawler::scheduler::effective_delay;
use crate::extract::ExtractionRules;
use crate::output::PipelineReport;
use crate::page::{DiscoveredPage, PageSource};
use crate::robots::RobotsTxtResolver;
use crate::sitemap::SitemapResolver;
use crate::url::normalize_url;
use crate::DigestError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Discovery source reported when pages came from the link crawl
pub const SOURCE_CRAWLED: &str = "crawled";

/// Discovery source reported when only the start URL is used
pub const SOURCE_HOMEPAGE: &str = "homepage";

/// Pages found for a site plus the pacing to use when fetching them
#[derive(Debug, Clone)]
pub struct Discovery {
    pub pages: Vec<DiscoveredPage>,
    /// Sitemap URL, `"crawled"` or `"homepage"`
    pub source: String,
    /// Delay after each request to the site
    pub request_delay: Duration,
}

/// Main pipeline coordinator
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<HttpFetcher>,
    rules: Arc<ExtractionRules>,
    renderer: Option<Arc<dyn Renderer>>,
    cache: Option<Arc<dyn Cache>>,
}

impl Coordinator {
    /// Creates a coordinator
    ///
    /// Validates the configuration, builds the HTTP client and rule sets,
    /// opens the SQLite cache when `[cache] path` is set and prepares a
    /// Chromium renderer when the browser is enabled. The browser itself
    /// only starts once a page needs it.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(DigestError)` - Invalid configuration or unusable cache file
    pub fn new(config: Config) -> Result<Self, DigestError> {
        validate(&config)?;

        let fetcher = Arc::new(HttpFetcher::new(&config.crawl, &config.fetch)?);
        let rules = Arc::new(ExtractionRules::from_config(&config.rules)?);

        let renderer: Option<Arc<dyn Renderer>> = if config.browser.enabled {
            Some(Arc::new(ChromiumRenderer::new(
                config.browser.clone(),
                &config.fetch.user_agent,
            )))
        } else {
            None
        };

        let cache: Option<Arc<dyn Cache>> = match &config.cache.path {
            Some(path) => {
                tracing::info!("Using sitemap cache at {}", path);
                let sqlite = SqliteCache::new(Path::new(path))?;
                match sqlite.purge_expired() {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Purged {} expired cache entries", n),
                    Err(e) => tracing::warn!("Failed to purge expired cache entries: {}", e),
                }
                Some(Arc::new(sqlite))
            }
            None => None,
        };

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            rules,
            renderer,
            cache,
        })
    }

    /// Replaces the renderer; `None` disables browser rendering
    pub fn with_renderer(mut self, renderer: Option<Arc<dyn Renderer>>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replaces the sitemap cache
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Finds the pages to extract for a site
    ///
    /// # Order
    ///
    /// 1. robots.txt for sitemap hints, disallowed prefixes and crawl delay
    /// 2. Sitemaps at the site root (hints first, then conventional paths)
    /// 3. Breadth-first link crawl if no sitemap lists any page
    /// 4. The start URL alone if nothing else was found
    ///
    /// The result never holds more than `max-urls` pages.
    pub async fn discover(&self, start_url: &Url) -> Discovery {
        let crawl = &self.config.crawl;

        let robots = RobotsTxtResolver::new(self.fetcher.clone(), &self.config.fetch.crawler_name)
            .resolve(start_url)
            .await;

        let (disallowed, request_delay) = if crawl.respect_robots_txt {
            (
                robots.disallowed_paths.clone(),
                effective_delay(crawl.crawl_delay_ms, robots.crawl_delay),
            )
        } else {
            tracing::debug!("Ignoring robots.txt rules for {}", start_url);
            (Vec::new(), effective_delay(crawl.crawl_delay_ms, None))
        };

        let site_root = start_url.join("/").unwrap_or_else(|_| start_url.clone());
        let resolution = SitemapResolver::new(self.fetcher.clone(), self.cache.clone())
            .resolve(&site_root, &robots.sitemap_urls)
            .await;

        let (mut pages, source) = if resolution.is_empty() {
            tracing::info!("No sitemap entries for {}, crawling links", site_root);
            let mut crawler = LinkDiscoveryCrawler::new(
                self.fetcher.clone(),
                self.rules.clone(),
                crawl.max_urls,
                crawl.max_depth,
                request_delay,
            );
            if let Some(renderer) = &self.renderer {
                crawler = crawler.with_renderer(renderer.clone());
            }
            (
                crawler.crawl(start_url, &disallowed).await,
                SOURCE_CRAWLED.to_string(),
            )
        } else {
            let source = resolution
                .source
                .clone()
                .unwrap_or_else(|| PageSource::Sitemap.to_string());
            let pages = resolution
                .entries
                .into_iter()
                .map(|entry| DiscoveredPage::new(entry.url, PageSource::Sitemap, 0))
                .collect::<Vec<_>>();
            (pages, source)
        };

        pages.truncate(crawl.max_urls);

        if pages.is_empty() {
            tracing::info!("Nothing discovered, falling back to {}", start_url);
            return Discovery {
                pages: vec![DiscoveredPage::new(
                    start_url.as_str(),
                    PageSource::Homepage,
                    0,
                )],
                source: SOURCE_HOMEPAGE.to_string(),
                request_delay,
            };
        }

        tracing::info!("Discovered {} page(s) via {}", pages.len(), source);
        Discovery {
            pages,
            source,
            request_delay,
        }
    }

    /// Runs discovery and extraction for `start_url`
    ///
    /// The browser is shut down before returning, whether the run succeeded
    /// or not.
    ///
    /// # Returns
    ///
    /// * `Ok(PipelineReport)` - One extracted page per discovered page
    /// * `Err(DigestError)` - Invalid start URL or browser launch failure
    pub async fn run(
        &self,
        start_url: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<PipelineReport, DigestError> {
        let start_url = normalize_url(start_url)?;
        let result = self.run_inner(&start_url, progress).await;

        if let Some(renderer) = &self.renderer {
            renderer.shutdown().await;
        }

        result
    }

    async fn run_inner(
        &self,
        start_url: &Url,
        progress: Option<ProgressCallback>,
    ) -> Result<PipelineReport, DigestError> {
        tracing::info!("Starting pipeline for {}", start_url);
        let start_time = std::time::Instant::now();

        let discovery = self.discover(start_url).await;

        let mut fetcher = AdaptivePageFetcher::new(
            self.fetcher.clone(),
            self.rules.clone(),
            discovery.request_delay,
        );
        if let Some(renderer) = &self.renderer {
            fetcher = fetcher.with_renderer(renderer.clone());
        }

        let pages = fetcher
            .fetch_all(
                &discovery.pages,
                self.config.fetch.concurrency,
                self.config.fetch.render_concurrency,
                progress,
            )
            .await?;

        let report = PipelineReport::new(start_url.as_str(), discovery.source, pages);
        tracing::info!(
            "Pipeline completed: {} processed, {} failed in {:?}",
            report.pages_processed,
            report.pages_failed,
            start_time.elapsed()
        );

        Ok(report)
    }
}

/// Runs the whole pipeline with the given configuration
///
/// # Example
///
/// ```no_run
/// use site_digest::config::Config;
/// use site_digest::crawler::run_pipeline;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_pipeline(Config::default(), "https://example.com").await?;
/// println!("{} pages", report.total_pages);
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline(config: Config, start_url: &str) -> Result<PipelineReport, DigestError> {
    Coordinator::new(config)?.run(start_url, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::config::CrawlConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.browser.enabled = false;
        config.crawl = CrawlConfig {
            crawl_delay_ms: 0,
            max_urls: 5,
            ..CrawlConfig::default()
        };
        config
    }

    async fn mount(server: &MockServer, route: &str, body: String, content_type: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
            .mount(server)
            .await;
    }

    fn urlset(server: &MockServer, routes: &[&str]) -> String {
        let urls = routes
            .iter()
            .map(|r| format!("<url><loc>{}{}</loc></url>", server.uri(), r))
            .collect::<String>();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
            urls
        )
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = test_config();
        config.crawl.max_urls = 0;
        assert!(matches!(Coordinator::new(config), Err(DigestError::Config(_))));
    }

    #[test]
    fn test_new_without_browser_has_no_renderer() {
        let coordinator = Coordinator::new(test_config()).unwrap();
        assert!(coordinator.renderer.is_none());
        assert!(coordinator.cache.is_none());
    }

    #[tokio::test]
    async fn test_discover_uses_sitemap_and_caps() {
        let server = MockServer::start().await;
        let routes = ["/a", "/b", "/c", "/d", "/e", "/f", "/g"];
        mount(&server, "/sitemap.xml", urlset(&server, &routes), "application/xml").await;

        let coordinator = Coordinator::new(test_config())
            .unwrap()
            .with_cache(Arc::new(MemoryCache::new()));
        let start = Url::parse(&server.uri()).unwrap();
        let discovery = coordinator.discover(&start).await;

        assert_eq!(discovery.pages.len(), 5);
        assert!(discovery.source.ends_with("/sitemap.xml"));
        assert!(discovery.pages.iter().all(|p| p.source == PageSource::Sitemap));
    }

    #[tokio::test]
    async fn test_discover_applies_robots_delay() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/robots.txt",
            format!("User-agent: *\nCrawl-delay: 2\nSitemap: {}/pages.xml\n", server.uri()),
            "text/plain",
        )
        .await;
        mount(&server, "/pages.xml", urlset(&server, &["/x"]), "application/xml").await;

        let coordinator = Coordinator::new(test_config()).unwrap();
        let discovery = coordinator.discover(&Url::parse(&server.uri()).unwrap()).await;

        assert_eq!(discovery.request_delay, Duration::from_secs(2));
        assert!(discovery.source.ends_with("/pages.xml"));
        assert_eq!(discovery.pages.len(), 1);
    }

    #[tokio::test]
    async fn test_discover_ignores_robots_when_disabled() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/robots.txt",
            "User-agent: *\nCrawl-delay: 2\nDisallow: /\n".to_string(),
            "text/plain",
        )
        .await;

        let mut config = test_config();
        config.crawl.respect_robots_txt = false;
        let coordinator = Coordinator::new(config).unwrap();
        let discovery = coordinator.discover(&Url::parse(&server.uri()).unwrap()).await;

        assert_eq!(discovery.request_delay, Duration::ZERO);
        assert_eq!(discovery.source, SOURCE_CRAWLED);
        assert_eq!(discovery.pages[0].source, PageSource::Crawl);
    }

    #[tokio::test]
    async fn test_discover_falls_back_to_homepage() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/robots.txt",
            "User-agent: *\nDisallow: /\n".to_string(),
            "text/plain",
        )
        .await;

        let coordinator = Coordinator::new(test_config()).unwrap();
        let start = Url::parse(&server.uri()).unwrap();
        let discovery = coordinator.discover(&start).await;

        assert_eq!(discovery.source, SOURCE_HOMEPAGE);
        assert_eq!(discovery.pages.len(), 1);
        assert_eq!(discovery.pages[0].source, PageSource::Homepage);
        assert_eq!(discovery.pages[0].url, start.as_str());
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_start_url() {
        let coordinator = Coordinator::new(test_config()).unwrap();
        let result = coordinator.run("ftp://example.com", None).await;
        assert!(matches!(result, Err(DigestError::UrlError(_))));
    }
}
