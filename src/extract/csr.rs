//! Client-side rendering detection
//!
//! Decides from static HTML alone whether a page needs a browser render to
//! expose its content.

use crate::extract::metadata::extract_metadata;
use crate::extract::rules::ExtractionRules;
use crate::extract::visible_text_len;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

/// Body text above this length means the page is server rendered
const SUBSTANTIAL_TEXT_CHARS: usize = 200;

/// A root container with less text than this is treated as an empty shell
const EMPTY_ROOT_CHARS: usize = 50;

/// Body text below this alongside a `<noscript>` element indicates a shell
const NOSCRIPT_SHELL_CHARS: usize = 100;

/// Child elements that do not count as page structure
const NON_STRUCTURAL_TAGS: &[&str] = &["script", "style", "link"];

/// Outcome of CSR detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrVerdict {
    /// True if the content only appears after JavaScript runs
    pub is_csr: bool,
    /// True if title and description are both present in the static HTML
    pub has_usable_meta: bool,
}

/// Heuristic CSR detector
#[derive(Debug, Clone)]
pub struct CsrDetector {
    rules: Arc<ExtractionRules>,
}

impl CsrDetector {
    pub fn new(rules: Arc<ExtractionRules>) -> Self {
        Self { rules }
    }

    /// Parses `html` and classifies it
    pub fn detect_html(&self, html: &str) -> CsrVerdict {
        self.detect(&Html::parse_document(html))
    }

    /// Classifies an already parsed document
    ///
    /// # Rules
    ///
    /// Evaluated in order; the first that applies decides.
    ///
    /// 1. No body → CSR
    /// 2. Visible body text over 200 characters → not CSR
    /// 3. SSR hydration root with usable metadata → not CSR
    /// 4. SPA root container with under 50 characters of text → CSR
    /// 5. `<noscript>` present and body text under 100 characters → CSR
    /// 6. At most one structural body child and under 50 characters → CSR
    /// 7. Otherwise → not CSR
    pub fn detect(&self, document: &Html) -> CsrVerdict {
        let has_usable_meta = extract_metadata(document).is_usable();
        let verdict = |is_csr| CsrVerdict {
            is_csr,
            has_usable_meta,
        };

        let Some(body) = select_first(document, "body") else {
            return verdict(true);
        };

        let text_len = visible_text_len(body);
        if text_len > SUBSTANTIAL_TEXT_CHARS {
            return verdict(false);
        }

        let has_ssr_root = self
            .rules
            .ssr_root_ids()
            .iter()
            .any(|id| select_by_id(document, id).is_some());
        if has_ssr_root && has_usable_meta {
            return verdict(false);
        }

        let has_empty_spa_root = self.rules.spa_root_ids().iter().any(|id| {
            select_by_id(document, id).map_or(false, |root| visible_text_len(root) < EMPTY_ROOT_CHARS)
        });
        if has_empty_spa_root {
            tracing::trace!("Empty SPA root container found");
            return verdict(true);
        }

        if select_first(document, "noscript").is_some() && text_len < NOSCRIPT_SHELL_CHARS {
            return verdict(true);
        }

        let structural_children = body
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| !NON_STRUCTURAL_TAGS.contains(&child.value().name()))
            .count();
        if structural_children <= 1 && text_len < EMPTY_ROOT_CHARS {
            return verdict(true);
        }

        verdict(false)
    }
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

fn select_by_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    select_first(document, &format!("#{}", id))
}
