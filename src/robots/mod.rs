//! Robots.txt handling module
//!
//! Fetches a site's robots.txt and extracts sitemap hints, crawl delay and
//! disallowed prefixes for our crawler. A missing or unreadable file is not
//! an error; it simply yields empty directives.

mod parser;

pub use parser::{parse_directives, RobotsDirectives};

use crate::crawler::HttpFetcher;
use std::sync::Arc;
use url::Url;

/// Resolves robots.txt directives for a site
#[derive(Debug, Clone)]
pub struct RobotsTxtResolver {
    fetcher: Arc<HttpFetcher>,
    agent: String,
}

impl RobotsTxtResolver {
    /// Creates a resolver matching groups for `agent`
    pub fn new(fetcher: Arc<HttpFetcher>, agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            agent: agent.into(),
        }
    }

    /// Returns the robots.txt URL for the origin of `base_url`
    pub fn robots_url(base_url: &Url) -> Option<Url> {
        base_url.join("/robots.txt").ok()
    }

    /// Fetches and parses `{origin}/robots.txt`
    ///
    /// # Returns
    ///
    /// The parsed directives, or empty directives if the file could not be
    /// fetched.
    pub async fn resolve(&self, base_url: &Url) -> RobotsDirectives {
        let Some(robots_url) = Self::robots_url(base_url) else {
            return RobotsDirectives::default();
        };

        match self.fetcher.fetch_text_safe(robots_url.as_str()).await {
            Some(content) => {
                let directives = parse_directives(&content, &self.agent);
                tracing::info!(
                    "robots.txt: {} sitemap(s), {} disallowed prefix(es), crawl-delay {:?}",
                    directives.sitemap_urls.len(),
                    directives.disallowed_paths.len(),
                    directives.crawl_delay
                );
                directives
            }
            None => {
                tracing::info!("No robots.txt at {}", robots_url);
                RobotsDirectives::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::build_http_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver() -> RobotsTxtResolver {
        let client = build_http_client("TestBot/1.0", Duration::from_secs(5)).unwrap();
        RobotsTxtResolver::new(Arc::new(HttpFetcher::with_client(client)), "TestBot")
    }

    #[test]
    fn test_robots_url_uses_origin() {
        let base = Url::parse("https://a.com/docs/guide?x=1").unwrap();
        assert_eq!(
            RobotsTxtResolver::robots_url(&base).unwrap().as_str(),
            "https://a.com/robots.txt"
        );
    }

    #[tokio::test]
    async fn test_resolve_fetches_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "User-agent: TestBot\nDisallow: /private\nCrawl-delay: 1\nSitemap: https://a.com/s.xml\n",
            ))
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/start", server.uri())).unwrap();
        let directives = resolver().resolve(&base).await;

        assert_eq!(directives.disallowed_paths, vec!["/private"]);
        assert_eq!(directives.crawl_delay, Some(1.0));
        assert_eq!(directives.sitemap_urls, vec!["https://a.com/s.xml"]);
    }

    #[tokio::test]
    async fn test_missing_robots_is_empty() {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri()).unwrap();
        assert_eq!(resolver().resolve(&base).await, RobotsDirectives::default());
    }
}
