//! Adaptive per-page fetching
//!
//! Every discovered page goes through an HTTP phase and, when the static
//! HTML is not enough, a browser render phase:
//!
//! ```text
//! Pending -> HttpFetched -> Accepted | Rejected | NeedsRender
//! NeedsRender -> Rendered -> Accepted | Rejected
//! ```
//!
//! Exactly one `ExtractedPage` is produced per input page, in input order.
//! Per-page failures end up in that page's `error` field.

use crate::crawler::fetcher::{FetchResult, HttpFetcher};
use crate::crawler::render::Renderer;
use crate::crawler::scheduler::Scheduler;
use crate::extract::{truncate_chars, CsrVerdict, ExtractionRules, PageAnalyzer};
use crate::page::{DiscoveredPage, ExtractedPage};
use crate::state::{PageSlot, PageState};
use crate::{DigestError, PageError};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Called after each page finishes a phase with
/// `(completed, total, current_url)`
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// How much of the extracted content is checked for soft-404 phrases
const SOFT_404_PREFIX_CHARS: usize = 500;

const RENDER_DISABLED: &str = "browser rendering disabled";

/// Result of the HTTP phase for one page
#[derive(Debug)]
enum HttpOutcome {
    Accepted(ExtractedPage),
    Rejected(ExtractedPage),
    NeedsRender {
        /// What the page resolves to if rendering does not succeed
        placeholder: ExtractedPage,
        /// Whether the placeholder is worth keeping on render failure
        usable: bool,
    },
}

/// A page waiting for the render phase
struct PendingRender {
    index: usize,
    placeholder: ExtractedPage,
    usable: bool,
}

/// Shared progress counter
struct Progress {
    completed: AtomicUsize,
    total: AtomicUsize,
    callback: Option<ProgressCallback>,
}

impl Progress {
    fn new(total: usize, callback: Option<ProgressCallback>) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total: AtomicUsize::new(total),
            callback,
        }
    }

    fn extend(&self, extra: usize) {
        self.total.fetch_add(extra, Ordering::SeqCst);
    }

    fn step(&self, url: &str) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(callback) = &self.callback {
            callback(completed, self.total.load(Ordering::SeqCst), url);
        }
    }
}

fn advance(slot: &mut PageSlot, next: PageState) {
    if let Err(e) = slot.advance(next) {
        tracing::error!("{}", e);
    }
}

/// Fetches and extracts a batch of pages, rendering where needed
pub struct AdaptivePageFetcher {
    fetcher: Arc<HttpFetcher>,
    analyzer: PageAnalyzer,
    renderer: Option<Arc<dyn Renderer>>,
    request_delay: Duration,
}

impl AdaptivePageFetcher {
    /// Creates a fetcher without browser support
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared HTTP fetcher
    /// * `rules` - Rule sets for extraction and soft-404 detection
    /// * `request_delay` - Pause after each HTTP request
    pub fn new(
        fetcher: Arc<HttpFetcher>,
        rules: Arc<ExtractionRules>,
        request_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            analyzer: PageAnalyzer::new(rules),
            renderer: None,
            request_delay,
        }
    }

    /// Enables the render phase
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Fetches every page
    ///
    /// # Arguments
    ///
    /// * `pages` - Pages to fetch
    /// * `concurrency` - Size of the HTTP pool
    /// * `render_concurrency` - Size of the browser render pool
    /// * `progress` - Optional callback invoked after each page finishes a phase
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ExtractedPage>)` - One entry per input page, in input order
    /// * `Err(DigestError::Browser)` - The browser was needed but could not start
    pub async fn fetch_all(
        &self,
        pages: &[DiscoveredPage],
        concurrency: usize,
        render_concurrency: usize,
        progress: Option<ProgressCallback>,
    ) -> Result<Vec<ExtractedPage>, DigestError> {
        let scheduler = Scheduler::new(concurrency, render_concurrency, self.request_delay);
        let progress = Progress::new(pages.len(), progress);

        tracing::info!(
            "Fetching {} page(s) with concurrency {}",
            pages.len(),
            concurrency
        );

        let outcomes = {
            let scheduler = &scheduler;
            let progress = &progress;
            join_all(pages.iter().map(|page| async move {
                let outcome = {
                    let _permit = scheduler.acquire_http().await;
                    let outcome = self.http_phase(&page.url).await;
                    scheduler.pause().await;
                    outcome
                };
                progress.step(&page.url);
                outcome
            }))
            .await
        };

        let mut results = Vec::with_capacity(pages.len());
        let mut pending = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                HttpOutcome::Accepted(page) | HttpOutcome::Rejected(page) => results.push(page),
                HttpOutcome::NeedsRender {
                    placeholder,
                    usable,
                } => {
                    results.push(placeholder.clone());
                    pending.push(PendingRender {
                        index,
                        placeholder,
                        usable,
                    });
                }
            }
        }

        if !pending.is_empty() {
            for (index, page) in self.render_phase(pending, &scheduler, &progress).await? {
                results[index] = page;
            }
        }

        let failed = results.iter().filter(|p| !p.is_success()).count();
        tracing::info!(
            "Fetched {} page(s): {} succeeded, {} failed",
            results.len(),
            results.len() - failed,
            failed
        );

        Ok(results)
    }

    /// Fetches one page over HTTP and decides what happens next
    async fn http_phase(&self, url: &str) -> HttpOutcome {
        let mut slot = PageSlot::new(url);
        let result = self.fetcher.fetch_page(url).await;
        advance(&mut slot, PageState::HttpFetched);

        let (status, error) = match result {
            FetchResult::Success {
                status_code, body, ..
            } => match self.extract(url, &body, status_code, false) {
                Ok((page, verdict)) if verdict.is_csr => {
                    tracing::debug!(
                        "{} looks client-side rendered (usable meta: {})",
                        url,
                        verdict.has_usable_meta
                    );
                    advance(&mut slot, PageState::NeedsRender);
                    return HttpOutcome::NeedsRender {
                        placeholder: page,
                        usable: verdict.has_usable_meta,
                    };
                }
                Ok((page, _)) => {
                    advance(&mut slot, PageState::Accepted);
                    return HttpOutcome::Accepted(page);
                }
                Err(error) => (status_code, error),
            },
            FetchResult::HttpError { status_code } if matches!(status_code, 403 | 429) => {
                tracing::debug!("{} answered HTTP {}, trying the browser", url, status_code);
                advance(&mut slot, PageState::NeedsRender);
                return HttpOutcome::NeedsRender {
                    placeholder: ExtractedPage::failed(
                        url,
                        status_code,
                        &PageError::HttpStatus {
                            status: status_code,
                        },
                    ),
                    usable: false,
                };
            }
            FetchResult::HttpError { status_code } => (
                status_code,
                PageError::HttpStatus {
                    status: status_code,
                },
            ),
            FetchResult::ContentMismatch {
                status_code,
                content_type,
            } => (
                status_code,
                PageError::UnsupportedContentType { content_type },
            ),
            FetchResult::NetworkError { error } => (0, PageError::Transport(error)),
        };

        tracing::info!("Rejected {}: {}", url, error);
        advance(&mut slot, PageState::Rejected);
        HttpOutcome::Rejected(ExtractedPage::failed(url, status, &error))
    }

    /// Renders every pending page and returns `(index, page)` pairs
    async fn render_phase(
        &self,
        pending: Vec<PendingRender>,
        scheduler: &Scheduler,
        progress: &Progress,
    ) -> Result<Vec<(usize, ExtractedPage)>, DigestError> {
        let Some(renderer) = &self.renderer else {
            tracing::info!(
                "{} page(s) need a browser render but rendering is disabled",
                pending.len()
            );
            return Ok(pending
                .into_iter()
                .map(|p| {
                    // A blocked status already says why the page failed.
                    if p.placeholder.error.is_some() {
                        return (p.index, p.placeholder);
                    }
                    let error = PageError::Render(RENDER_DISABLED.to_string());
                    (p.index, Self::resolve_unrendered(p.placeholder, p.usable, error))
                })
                .collect());
        };

        progress.extend(pending.len());

        if let Err(e) = renderer.launch().await {
            renderer.shutdown().await;
            return Err(e);
        }

        tracing::info!("Rendering {} page(s) in the browser", pending.len());
        let merged = join_all(pending.into_iter().map(|p| async move {
            let page = {
                let _permit = scheduler.acquire_render().await;
                self.render_one(renderer.as_ref(), p.placeholder, p.usable).await
            };
            progress.step(&page.url);
            (p.index, page)
        }))
        .await;

        renderer.shutdown().await;
        tracing::info!("Render phase finished");
        Ok(merged)
    }

    /// Renders one page and merges the result with its HTTP placeholder
    async fn render_one(
        &self,
        renderer: &dyn Renderer,
        placeholder: ExtractedPage,
        usable: bool,
    ) -> ExtractedPage {
        let url = placeholder.url.clone();
        let mut slot = PageSlot::awaiting_render(url.as_str());
        let rendered = renderer.render(&url).await;

        if let Some(message) = rendered.error {
            advance(&mut slot, PageState::Rejected);
            tracing::info!("Render of {} failed: {}", url, message);
            return Self::resolve_unrendered(placeholder, usable, PageError::Render(message));
        }

        advance(&mut slot, PageState::Rendered);
        match self.extract(&url, &rendered.html, rendered.status, true) {
            Ok((mut page, _)) => {
                advance(&mut slot, PageState::Accepted);
                if page.title.is_none() {
                    page.title = rendered.title;
                }
                page
            }
            Err(error) => {
                advance(&mut slot, PageState::Rejected);
                tracing::info!("Rejected rendered {}: {}", url, error);
                if usable {
                    placeholder
                } else {
                    ExtractedPage::failed(url, rendered.status, &error)
                }
            }
        }
    }

    /// Keeps a usable HTTP result, otherwise reports `error`
    fn resolve_unrendered(
        placeholder: ExtractedPage,
        usable: bool,
        error: PageError,
    ) -> ExtractedPage {
        if usable && placeholder.is_success() {
            tracing::debug!("Keeping HTTP result for {}", placeholder.url);
            placeholder
        } else {
            ExtractedPage::failed(placeholder.url, placeholder.fetch_status, &error)
        }
    }

    /// Extracts a page from HTML, rejecting soft-404 pages
    fn extract(
        &self,
        url: &str,
        html: &str,
        status: u16,
        is_js_rendered: bool,
    ) -> Result<(ExtractedPage, CsrVerdict), PageError> {
        let analysis = self.analyzer.analyze(html);
        let metadata = analysis.metadata;

        let prefix = truncate_chars(&analysis.content, SOFT_404_PREFIX_CHARS);
        let fields = [
            metadata.title.as_deref().unwrap_or(""),
            metadata.description.as_deref().unwrap_or(""),
            prefix.as_str(),
        ];
        if let Some(signal) = self.analyzer.rules().soft_404_signal(&fields) {
            return Err(PageError::SoftNotFound {
                signal: signal.to_string(),
            });
        }

        let page = ExtractedPage {
            url: url.to_string(),
            title: metadata.title,
            description: metadata.description,
            og_title: metadata.og_title,
            og_description: metadata.og_description,
            og_type: metadata.og_type,
            og_image: metadata.og_image,
            content_text: analysis.content,
            is_js_rendered,
            fetch_status: status,
            error: None,
        };
        Ok((page, analysis.verdict))
    }
}
