//! Integration tests for the discovery and extraction pipeline
//!
//! These tests use wiremock to stand up a small site and run the whole
//! pipeline against it. Browser rendering is replaced by a scripted
//! renderer so no Chromium is needed.

use async_trait::async_trait;
use site_digest::config::Config;
use site_digest::crawler::{Coordinator, ProgressCallback, Renderer, SOURCE_CRAWLED};
use site_digest::{DigestError, RenderedPage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renderer returning canned HTML per URL path
#[derive(Default)]
struct ScriptedRenderer {
    pages: HashMap<String, String>,
    renders: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl ScriptedRenderer {
    fn with_page(mut self, route: &str, html: &str) -> Self {
        self.pages.insert(route.to_string(), html.to_string());
        self
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn launch(&self) -> Result<(), DigestError> {
        Ok(())
    }

    async fn render(&self, url: &str) -> RenderedPage {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let route = url::Url::parse(url).unwrap().path().to_string();
        match self.pages.get(&route) {
            Some(html) => RenderedPage {
                url: url.to_string(),
                html: html.clone(),
                title: None,
                status: 200,
                error: None,
            },
            None => RenderedPage::failed(url, "Navigation failed: net::ERR_ABORTED"),
        }
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builds a server-rendered page with the given links
fn ssr_page(title: &str, links: &[&str]) -> String {
    let anchors = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect::<String>();
    format!(
        r#"<html><head><title>{title}</title>
        <meta name="description" content="About {title}"></head>
        <body><nav><ul>{anchors}</ul></nav>
        <main><h1>{title}</h1>
        <p>This page explains {title} in detail, with examples drawn from real customer deployments and a short walkthrough.</p>
        </main></body></html>"#
    )
}

const SPA_SHELL: &str =
    r#"<html><head></head><body><div id="root"></div><script src="/static/app.js"></script></body></html>"#;

const RENDERED_PRICING: &str = r#"<html><head><title>Pricing</title>
    <meta name="description" content="Plans for every team"></head>
    <body><div id="root"><main><h1>Pricing</h1>
    <p>Start on the free tier and move to a paid plan when your team needs single sign-on and audit logs.</p>
    <p>Get started</p><p>Book a demo</p><p>Contact sales</p>
    </main></div></body></html>"#;

async fn mount(server: &MockServer, route: &str, body: String, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .mount(server)
        .await;
}

fn test_config(max_depth: u32) -> Config {
    let mut config = Config::default();
    config.browser.enabled = false;
    config.crawl.crawl_delay_ms = 0;
    config.crawl.max_depth = max_depth;
    config.crawl.timeout_seconds = 5;
    config
}

fn page_path(url: &str) -> String {
    url::Url::parse(url).unwrap().path().to_string()
}

#[tokio::test]
async fn test_sitemap_site_with_server_rendered_pages() {
    let server = MockServer::start().await;
    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>{0}/product</loc><priority>0.9</priority></url>
          <url><loc>{0}/about/</loc></url>
        </urlset>"#,
        server.uri()
    );
    mount(&server, "/sitemap.xml", sitemap, "application/xml").await;
    mount(&server, "/product", ssr_page("Product", &[]), "text/html").await;
    mount(&server, "/about", ssr_page("Company", &[]), "text/html").await;

    let coordinator = Coordinator::new(test_config(2)).unwrap();
    let report = coordinator.run(&server.uri(), None).await.unwrap();

    assert!(report.discovery_source.ends_with("/sitemap.xml"));
    assert_eq!(report.total_pages, 2);
    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.pages_failed, 0);
    assert!(report.pages.iter().all(|p| !p.is_js_rendered));
    assert_eq!(page_path(&report.pages[0].url), "/product");
    assert_eq!(page_path(&report.pages[1].url), "/about");
    assert_eq!(report.pages[0].title.as_deref(), Some("Product"));
    assert_eq!(report.pages[0].description.as_deref(), Some("About Product"));
    assert!(report.pages[0].content_text.contains("real customer deployments"));
}

#[tokio::test]
async fn test_crawled_site_with_client_rendered_page() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        ssr_page("Home", &["/pricing", "/team", "/old-page", "https://other.example/"]),
        "text/html",
    )
    .await;
    mount(&server, "/pricing", SPA_SHELL.to_string(), "text/html").await;
    mount(&server, "/team", ssr_page("Team", &["/"]), "text/html").await;
    mount(
        &server,
        "/old-page",
        "<html><head><title>Page Not Found</title></head><body><p>Sorry about that.</p></body></html>"
            .to_string(),
        "text/html",
    )
    .await;

    let renderer = Arc::new(ScriptedRenderer::default().with_page("/pricing", RENDERED_PRICING));
    let coordinator = Coordinator::new(test_config(1))
        .unwrap()
        .with_renderer(Some(renderer.clone()));

    let report = coordinator.run(&server.uri(), None).await.unwrap();

    assert_eq!(report.discovery_source, SOURCE_CRAWLED);
    let paths: Vec<_> = report.pages.iter().map(|p| page_path(&p.url)).collect();
    assert_eq!(paths, vec!["/", "/pricing", "/team", "/old-page"]);

    let pricing = &report.pages[1];
    assert!(pricing.is_success());
    assert!(pricing.is_js_rendered);
    assert_eq!(pricing.title.as_deref(), Some("Pricing"));
    assert!(pricing.content_text.contains("audit logs"));
    assert!(!pricing.content_text.contains("Book a demo"));

    let old = &report.pages[3];
    assert_eq!(old.error.as_deref(), Some("Soft 404 detected: page not found"));
    assert!(old.content_text.is_empty());

    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 1);
    assert!(renderer.shutdowns.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_crawl_honors_robots_disallow() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/robots.txt",
        "User-agent: *\nDisallow: /private\n".to_string(),
        "text/plain",
    )
    .await;
    mount(
        &server,
        "/",
        ssr_page("Home", &["/private/reports", "/public"]),
        "text/html",
    )
    .await;
    mount(&server, "/public", ssr_page("Public", &[]), "text/html").await;

    let coordinator = Coordinator::new(test_config(1)).unwrap();
    let report = coordinator.run(&server.uri(), None).await.unwrap();

    let paths: Vec<_> = report.pages.iter().map(|p| page_path(&p.url)).collect();
    assert_eq!(paths, vec!["/", "/public"]);
}

#[tokio::test]
async fn test_progress_reports_every_page() {
    let server = MockServer::start().await;
    mount(&server, "/", ssr_page("Home", &["/a", "/b"]), "text/html").await;
    mount(&server, "/a", ssr_page("A page", &[]), "text/html").await;
    mount(&server, "/b", ssr_page("B page", &[]), "text/html").await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let progress: ProgressCallback = Arc::new(move |done: usize, total: usize, url: &str| {
        sink.lock().unwrap().push((done, total, url.to_string()));
    });

    let coordinator = Coordinator::new(test_config(1)).unwrap();
    let report = coordinator.run(&server.uri(), Some(progress)).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), report.total_pages);
    assert_eq!(seen.last().map(|(done, total, _)| (*done, *total)), Some((3, 3)));
}
