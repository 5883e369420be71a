//! Breadth-first link discovery
//!
//! Used when a site offers no sitemap. Starting from the homepage, same-site
//! links are followed level by level until the page cap or depth limit is
//! reached. Listing pages that only render client-side are re-read through
//! the browser so their links are not missed.

use crate::crawler::fetcher::{FetchResult, HttpFetcher};
use crate::crawler::parser::extract_links;
use crate::crawler::render::Renderer;
use crate::crawler::scheduler::Scheduler;
use crate::extract::{CsrDetector, ExtractionRules};
use crate::page::{DiscoveredPage, PageSource};
use crate::url::{is_same_site, normalize_url};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Why a dequeued URL was not recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    OffSite,
    AssetExtension,
    ExcludedPath,
    Disallowed,
}

/// Bounded BFS crawler over one site
pub struct LinkDiscoveryCrawler {
    fetcher: Arc<HttpFetcher>,
    renderer: Option<Arc<dyn Renderer>>,
    detector: CsrDetector,
    rules: Arc<ExtractionRules>,
    max_urls: usize,
    max_depth: u32,
    scheduler: Scheduler,
}

impl LinkDiscoveryCrawler {
    /// Creates a crawler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared HTTP fetcher
    /// * `rules` - Skip patterns and CSR markers
    /// * `max_urls` - Maximum number of pages recorded
    /// * `max_depth` - Pages at this depth are recorded but not expanded
    /// * `delay` - Pause after each page expansion
    pub fn new(
        fetcher: Arc<HttpFetcher>,
        rules: Arc<ExtractionRules>,
        max_urls: usize,
        max_depth: u32,
        delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            renderer: None,
            detector: CsrDetector::new(rules.clone()),
            rules,
            max_urls,
            max_depth,
            scheduler: Scheduler::new(1, 1, delay),
        }
    }

    /// Enables the browser fallback for client-rendered listing pages
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Crawls from `start_url`
    ///
    /// # Arguments
    ///
    /// * `start_url` - First page; defines the site
    /// * `disallowed_paths` - Path prefixes that must not be recorded
    ///
    /// # Returns
    ///
    /// Discovered pages in BFS order, at most `max_urls` of them.
    pub async fn crawl(&self, start_url: &Url, disallowed_paths: &[String]) -> Vec<DiscoveredPage> {
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut discovered = Vec::new();

        queue.push_back((start_url.to_string(), 0));
        queued.insert(start_url.to_string());

        while let Some((raw_url, depth)) = queue.pop_front() {
            if discovered.len() >= self.max_urls {
                break;
            }

            let url = match normalize_url(&raw_url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", raw_url, e);
                    continue;
                }
            };

            if !visited.insert(url.to_string()) {
                continue;
            }

            if let Some(reason) = self.skip_reason(&url, start_url, disallowed_paths) {
                tracing::trace!("Skipping {} ({:?})", url, reason);
                continue;
            }

            tracing::debug!("Discovered {} at depth {}", url, depth);
            discovered.push(DiscoveredPage::new(url.as_str(), PageSource::Crawl, depth));

            if depth >= self.max_depth {
                continue;
            }

            for link in self.page_links(&url).await {
                if queued.insert(link.clone()) {
                    queue.push_back((link, depth + 1));
                }
            }

            self.scheduler.pause().await;
        }

        tracing::info!(
            "Link discovery found {} page(s) from {}",
            discovered.len(),
            start_url
        );
        discovered
    }

    fn skip_reason(&self, url: &Url, start_url: &Url, disallowed_paths: &[String]) -> Option<SkipReason> {
        let path = url.path();

        if !is_same_site(url, start_url) {
            Some(SkipReason::OffSite)
        } else if self.rules.has_skip_extension(path) {
            Some(SkipReason::AssetExtension)
        } else if self.rules.has_skip_path(path) {
            Some(SkipReason::ExcludedPath)
        } else if disallowed_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            Some(SkipReason::Disallowed)
        } else {
            None
        }
    }

    /// Returns the links on one page
    ///
    /// The plain HTTP response is tried first. A client-rendered shell or a
    /// failed fetch falls back to the browser when one is available.
    async fn page_links(&self, url: &Url) -> Vec<String> {
        let (mut html, needs_render) = match self.fetcher.fetch_page(url.as_str()).await {
            FetchResult::Success { body, .. } => {
                let is_csr = self.detector.detect_html(&body).is_csr;
                (Some(body), is_csr)
            }
            FetchResult::ContentMismatch { .. } => return Vec::new(),
            other => {
                tracing::debug!("Fetch of {} failed during discovery: {:?}", url, other);
                (None, true)
            }
        };

        if needs_render {
            if let Some(renderer) = &self.renderer {
                tracing::debug!("Rendering {} to find links", url);
                let rendered = renderer.render(url.as_str()).await;
                if rendered.error.is_none() && !rendered.html.trim().is_empty() {
                    html = Some(rendered.html);
                }
            }
        }

        html.map(|html| extract_links(&html, url))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::build_http_client;
    use crate::page::RenderedPage;
    use crate::DigestError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticRenderer {
        html: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Renderer for StaticRenderer {
        async fn launch(&self) -> Result<(), DigestError> {
            Ok(())
        }

        async fn render(&self, url: &str) -> RenderedPage {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RenderedPage {
                url: url.to_string(),
                html: self.html.clone(),
                title: None,
                status: 200,
                error: None,
            }
        }

        async fn shutdown(&self) {}
    }

    fn html_page(links: &[&str]) -> ResponseTemplate {
        let anchors = links
            .iter()
            .map(|href| format!(r#"<a href="{}">link</a>"#, href))
            .collect::<String>();
        let body = format!(
            "<html><head><title>Page</title></head><body><nav>{}</nav><p>{}</p></body></html>",
            anchors,
            "Plenty of server rendered text so this page is not a client side shell. ".repeat(4)
        );
        ResponseTemplate::new(200).set_body_raw(body, "text/html")
    }

    async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn crawler(max_urls: usize, max_depth: u32) -> LinkDiscoveryCrawler {
        let fetcher = HttpFetcher::with_client(
            build_http_client("TestBot/1.0", Duration::from_secs(5)).unwrap(),
        );
        LinkDiscoveryCrawler::new(
            Arc::new(fetcher),
            Arc::new(ExtractionRules::builtin().unwrap()),
            max_urls,
            max_depth,
            Duration::ZERO,
        )
    }

    fn paths(pages: &[DiscoveredPage]) -> Vec<String> {
        pages
            .iter()
            .map(|p| Url::parse(&p.url).unwrap().path().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_crawl_respects_depth_and_filters() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/",
            html_page(&[
                "/about",
                "/about/#team",
                "/blog",
                "https://elsewhere.example/",
                "/brochure.pdf",
                "/login",
                "/private/area",
            ]),
        )
        .await;
        mount(&server, "/about", html_page(&["/", "/about/team"])).await;
        mount(&server, "/blog", html_page(&["/blog/post-1"])).await;
        mount(&server, "/about/team", html_page(&["/deep"])).await;
        mount(&server, "/blog/post-1", html_page(&["/deeper"])).await;

        let start = Url::parse(&format!("{}/", server.uri())).unwrap();
        let pages = crawler(50, 2)
            .crawl(&start, &["/private".to_string()])
            .await;

        assert_eq!(
            paths(&pages),
            vec!["/", "/about", "/blog", "/about/team", "/blog/post-1"]
        );
        assert!(pages.iter().all(|p| p.source == PageSource::Crawl));
        assert!(pages.iter().all(|p| p.depth <= 2));
        assert_eq!(pages[3].depth, 2);

        let unique: HashSet<_> = pages.iter().map(|p| p.url.clone()).collect();
        assert_eq!(unique.len(), pages.len());
    }

    #[tokio::test]
    async fn test_crawl_stops_at_max_urls() {
        let server = MockServer::start().await;
        mount(&server, "/", html_page(&["/a", "/b", "/c", "/d", "/e"])).await;

        let start = Url::parse(&server.uri()).unwrap();
        let pages = crawler(3, 2).crawl(&start, &[]).await;

        assert_eq!(paths(&pages), vec!["/", "/a", "/b"]);
    }

    #[tokio::test]
    async fn test_crawl_renders_client_side_shell() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/",
            ResponseTemplate::new(200).set_body_raw(
                r#"<html><head><title>App</title></head><body><div id="root"></div></body></html>"#,
                "text/html",
            ),
        )
        .await;

        let renderer = Arc::new(StaticRenderer {
            html: r#"<html><body><div id="root"><a href="/pricing">Pricing</a><a href="/docs">Docs</a></div></body></html>"#
                .to_string(),
            calls: AtomicUsize::new(0),
        });

        let start = Url::parse(&server.uri()).unwrap();
        let pages = crawler(10, 1)
            .with_renderer(renderer.clone())
            .crawl(&start, &[])
            .await;

        assert_eq!(paths(&pages), vec!["/", "/pricing", "/docs"]);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_crawl_follows_links_across_schemes() {
        // Nothing listens on the default https port, so the start page comes
        // from the renderer.
        let renderer = Arc::new(StaticRenderer {
            html: r#"<html><body><a href="http://localhost/about">About</a><a href="http://localhost:8081/admin">Admin</a></body></html>"#
                .to_string(),
            calls: AtomicUsize::new(0),
        });

        let start = Url::parse("https://localhost/").unwrap();
        let pages = crawler(10, 1)
            .with_renderer(renderer.clone())
            .crawl(&start, &[])
            .await;

        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://localhost/", "http://localhost/about"]);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_crawl_unreachable_start_records_only_start() {
        let start = Url::parse("http://127.0.0.1:1/").unwrap();
        let pages = crawler(10, 2).crawl(&start, &[]).await;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].depth, 0);
    }
}
