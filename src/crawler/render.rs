//! Headless browser rendering
//!
//! Pages whose content only appears after JavaScript runs are loaded in
//! Chromium. One browser process serves a whole batch; every page gets its
//! own browser context so cookies and storage never leak between pages.

use crate::config::BrowserConfig;
use crate::page::RenderedPage;
use crate::DigestError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Maximum time allowed for one navigation
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

const IMAGE_PATTERNS: &[&str] = &["*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.ico", "*.avif"];

const FONT_PATTERNS: &[&str] = &["*.woff", "*.woff2", "*.ttf", "*.otf", "*.eot"];

/// Something that can turn a URL into rendered HTML
///
/// Per-page failures are reported inside the returned `RenderedPage`; only
/// failing to start the underlying browser is an error.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Starts the browser if it is not already running
    async fn launch(&self) -> Result<(), DigestError>;

    /// Renders one page, launching the browser first if needed
    async fn render(&self, url: &str) -> RenderedPage;

    /// Closes the browser; safe to call repeatedly
    async fn shutdown(&self);
}

/// A running browser process and its event loop
///
/// `close` shuts the browser down cleanly. If the session is dropped without
/// being closed (for example when the job is cancelled), the event loop is
/// aborted and the browser process is killed on drop.
pub struct BrowserSession {
    browser: Option<Arc<Browser>>,
    handler: Option<JoinHandle<()>>,
}

impl BrowserSession {
    /// Launches Chromium with the given configuration
    pub async fn launch(config: ChromeConfig) -> Result<Self, DigestError> {
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DigestError::Browser(format!("Browser launch failed: {}", e)))?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        tracing::info!("Browser launched");
        Ok(Self {
            browser: Some(Arc::new(browser)),
            handler: Some(handler),
        })
    }

    /// Shared handle to the running browser
    pub fn browser(&self) -> Option<Arc<Browser>> {
        self.browser.clone()
    }

    /// Closes the browser process and stops the event loop
    pub async fn close(mut self) {
        if let Some(browser) = self.browser.take() {
            match Arc::try_unwrap(browser) {
                Ok(mut browser) => {
                    if let Err(e) = browser.close().await {
                        tracing::warn!("Browser close error: {}", e);
                    }
                }
                Err(_) => tracing::warn!("Browser still in use at shutdown; killing process"),
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        tracing::info!("Browser closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

/// Chromium-backed renderer
pub struct ChromiumRenderer {
    settings: BrowserConfig,
    user_agent: String,
    navigation_timeout: Duration,
    session: Mutex<Option<BrowserSession>>,
    launch_error: Mutex<Option<String>>,
}

impl ChromiumRenderer {
    /// Creates a renderer; the browser starts on first use
    ///
    /// # Arguments
    ///
    /// * `settings` - Browser section of the configuration
    /// * `fallback_user_agent` - Used when the browser section sets none
    pub fn new(settings: BrowserConfig, fallback_user_agent: &str) -> Self {
        let user_agent = settings
            .user_agent
            .clone()
            .unwrap_or_else(|| fallback_user_agent.to_string());

        Self {
            settings,
            user_agent,
            navigation_timeout: NAVIGATION_TIMEOUT,
            session: Mutex::new(None),
            launch_error: Mutex::new(None),
        }
    }

    /// URL patterns blocked in every page
    pub fn blocked_patterns(&self) -> Vec<String> {
        let mut patterns = Vec::new();
        if self.settings.block_images {
            patterns.extend(IMAGE_PATTERNS.iter().map(|p| p.to_string()));
        }
        if self.settings.block_fonts {
            patterns.extend(FONT_PATTERNS.iter().map(|p| p.to_string()));
        }
        patterns
    }

    fn chrome_config(&self) -> Result<ChromeConfig, DigestError> {
        let mut builder = ChromeConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", self.user_agent))
            .window_size(self.settings.viewport_width, self.settings.viewport_height);

        if !self.settings.headless {
            builder = builder.with_head();
        }

        builder
            .build()
            .map_err(|e| DigestError::Browser(format!("Browser config error: {}", e)))
    }

    /// Returns the running browser, launching it if necessary
    async fn browser(&self) -> Result<Arc<Browser>, DigestError> {
        let mut session = self.session.lock().await;
        if let Some(browser) = session.as_ref().and_then(BrowserSession::browser) {
            return Ok(browser);
        }

        // A failed launch is not retried within the same renderer
        if let Some(message) = self.launch_error.lock().await.clone() {
            return Err(DigestError::Browser(message));
        }

        let launched = match self.chrome_config() {
            Ok(config) => BrowserSession::launch(config).await,
            Err(e) => Err(e),
        };

        match launched {
            Ok(new_session) => {
                let browser = new_session.browser();
                *session = Some(new_session);
                browser.ok_or_else(|| DigestError::Browser("Browser session is empty".to_string()))
            }
            Err(e) => {
                tracing::error!("{}", e);
                *self.launch_error.lock().await = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Renders `url` inside a fresh browser context
    async fn render_isolated(&self, browser: &Browser, url: &str) -> Result<RenderedPage, String> {
        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| format!("Failed to create browser context: {}", e))?
            .result
            .browser_context_id;

        let mut params = CreateTargetParams::new("about:blank");
        params.browser_context_id = Some(context_id.clone());

        let outcome = match browser.new_page(params).await {
            Ok(page) => {
                let captured = self.capture(&page, url).await;
                if let Err(e) = page.close().await {
                    tracing::debug!("Page close error for {}: {}", url, e);
                }
                captured
            }
            Err(e) => Err(format!("Failed to open page: {}", e)),
        };

        if let Err(e) = browser
            .execute(DisposeBrowserContextParams::new(context_id))
            .await
        {
            tracing::debug!("Failed to dispose browser context for {}: {}", url, e);
        }

        outcome
    }

    /// Navigates and captures HTML and title
    async fn capture(&self, page: &Page, url: &str) -> Result<RenderedPage, String> {
        let patterns = self.blocked_patterns();
        if !patterns.is_empty() {
            if let Err(e) = page.execute(EnableParams::default()).await {
                tracing::debug!("Failed to enable network domain: {}", e);
            }
            if let Err(e) = page.execute(SetBlockedUrLsParams::new(patterns)).await {
                tracing::debug!("Failed to block resource patterns: {}", e);
            }
        }

        tokio::time::timeout(self.navigation_timeout, page.goto(url))
            .await
            .map_err(|_| format!("Navigation timed out after {:?}", self.navigation_timeout))?
            .map_err(|e| format!("Navigation failed: {}", e))?;

        let html = page
            .content()
            .await
            .map_err(|e| format!("Failed to get content: {}", e))?;
        let title = page.get_title().await.ok().flatten();

        Ok(RenderedPage {
            url: url.to_string(),
            html,
            title,
            // A completed navigation is reported as 200
            status: 200,
            error: None,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn launch(&self) -> Result<(), DigestError> {
        self.browser().await.map(|_| ())
    }

    async fn render(&self, url: &str) -> RenderedPage {
        let browser = match self.browser().await {
            Ok(browser) => browser,
            Err(e) => return RenderedPage::failed(url, e.to_string()),
        };

        tracing::debug!("Rendering {}", url);
        match self.render_isolated(&browser, url).await {
            Ok(page) => page,
            Err(message) => {
                tracing::info!("Render of {} failed: {}", url, message);
                RenderedPage::failed(url, message)
            }
        }
    }

    async fn shutdown(&self) {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            session.close().await;
        }
    }
}
