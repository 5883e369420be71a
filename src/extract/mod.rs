//! HTML analysis for Site-Digest
//!
//! This module turns raw page HTML into the fields of an `ExtractedPage`:
//!
//! - `rules`: phrase lists, selectors and path filters
//! - `metadata`: title, description and Open Graph fields
//! - `csr`: client-side rendering detection
//! - `content`: main-content markdown with noise removed

mod content;
mod csr;
mod metadata;
mod rules;

pub use content::{convert_to_markdown, truncate_at_line, ContentNormalizer, MAX_CONTENT_CHARS};
pub use csr::{CsrDetector, CsrVerdict};
pub use metadata::{
    collapse_whitespace, extract_description, extract_metadata, extract_title, meta_content,
    truncate_chars, PageMetadata, MAX_DESCRIPTION_CHARS,
};
pub use rules::ExtractionRules;

use scraper::{ElementRef, Html};
use std::sync::Arc;

/// Elements whose text is never rendered
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Counts the characters of visible text under `element`
///
/// Each text node is trimmed before counting, and text inside script,
/// style, noscript and template elements is ignored.
pub fn visible_text_len(element: ElementRef<'_>) -> usize {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |el| INVISIBLE_TAGS.contains(&el.name()))
            });
            (!hidden).then(|| text.trim().chars().count())
        })
        .sum()
}

/// Everything extracted from one HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAnalysis {
    pub metadata: PageMetadata,
    pub verdict: CsrVerdict,
    pub content: String,
}

/// Runs metadata extraction, CSR detection and content normalization
#[derive(Debug, Clone)]
pub struct PageAnalyzer {
    detector: CsrDetector,
    normalizer: ContentNormalizer,
}

impl PageAnalyzer {
    pub fn new(rules: Arc<ExtractionRules>) -> Self {
        Self {
            detector: CsrDetector::new(rules.clone()),
            normalizer: ContentNormalizer::new(rules),
        }
    }

    pub fn rules(&self) -> &ExtractionRules {
        self.normalizer.rules()
    }

    pub fn detector(&self) -> &CsrDetector {
        &self.detector
    }

    /// Analyzes a full HTML document
    pub fn analyze(&self, html: &str) -> PageAnalysis {
        let (metadata, verdict) = {
            let document = Html::parse_document(html);
            (extract_metadata(&document), self.detector.detect(&document))
        };

        PageAnalysis {
            metadata,
            verdict,
            content: self.normalizer.extract_content(html),
        }
    }
}
