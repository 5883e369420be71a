//! Main-content extraction and markdown cleanup

use crate::extract::rules::ExtractionRules;
use crate::extract::visible_text_len;
use htmd::HtmlToMarkdown;
use scraper::{Html, Selector};
use std::sync::Arc;

/// Maximum length of extracted content in characters
pub const MAX_CONTENT_CHARS: usize = 5000;

/// A content region needs more visible text than this to be chosen
const MIN_REGION_CHARS: usize = 100;

/// Tags dropped during markdown conversion
const SKIPPED_TAGS: &[&str] = &["img", "picture", "video", "audio", "canvas", "svg", "script", "style"];

/// Converts page HTML into bounded, noise-free markdown
#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    rules: Arc<ExtractionRules>,
}

impl ContentNormalizer {
    pub fn new(rules: Arc<ExtractionRules>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Extracts the main content of `html` as cleaned markdown
    ///
    /// # Steps
    ///
    /// 1. Remove navigation, chrome, ads, CTA blocks and logo grids
    /// 2. Pick the first content region with enough text, else `<body>`
    /// 3. Convert to markdown, dropping images
    /// 4. Remove CTA lines and links, logo lines and social-proof lines
    /// 5. Collapse blank lines and truncate to 5000 characters at a line break
    pub fn extract_content(&self, html: &str) -> String {
        let mut document = Html::parse_document(html);
        self.remove_noise(&mut document);

        let region = self.main_region_html(&document);
        let markdown = convert_to_markdown(&region);
        let cleaned = self.clean_markdown(&markdown);

        truncate_at_line(&cleaned, MAX_CONTENT_CHARS)
    }

    /// Detaches every element matching a noise selector
    fn remove_noise(&self, document: &mut Html) {
        for css in self.rules.noise_selectors() {
            let Ok(selector) = Selector::parse(css) else {
                tracing::debug!("Skipping unparseable noise selector {}", css);
                continue;
            };

            let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
            for id in ids {
                if let Some(mut node) = document.tree.get_mut(id) {
                    node.detach();
                }
            }
        }
    }

    /// Returns the outer HTML of the region holding the page's content
    fn main_region_html(&self, document: &Html) -> String {
        for css in self.rules.content_selectors() {
            let Ok(selector) = Selector::parse(css) else {
                continue;
            };

            if let Some(region) = document.select(&selector).next() {
                if visible_text_len(region) > MIN_REGION_CHARS {
                    return region.html();
                }
            }
        }

        if let Ok(body_selector) = Selector::parse("body") {
            if let Some(body) = document.select(&body_selector).next() {
                return body.html();
            }
        }

        document.root_element().html()
    }

    /// Removes CTA, logo and social-proof noise from converted markdown
    pub fn clean_markdown(&self, markdown: &str) -> String {
        let link_re = self.rules.markdown_link_re();
        let mut kept: Vec<String> = Vec::new();

        for raw in markdown.lines() {
            let line = raw.trim_end();

            if self.rules.is_cta(strip_list_marker(line)) {
                continue;
            }

            let without_cta_links = link_re.replace_all(line, |caps: &regex::Captures| {
                let text = &caps[1];
                if text.trim().is_empty() || self.rules.is_cta(text) {
                    String::new()
                } else {
                    caps[0].to_string()
                }
            });
            if without_cta_links != line && is_markup_only(&without_cta_links) {
                continue;
            }
            let line = without_cta_links.trim_end();

            if self.rules.is_logo_line(strip_list_marker(line)) || self.rules.is_social_proof(line) {
                continue;
            }

            kept.push(line.to_string());
        }

        collapse_blank_lines(&kept)
    }
}

/// Converts HTML to markdown; conversion failures yield an empty string
pub fn convert_to_markdown(html: &str) -> String {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    converter.convert(html).unwrap_or_else(|e| {
        tracing::debug!("Markdown conversion failed: {}", e);
        String::new()
    })
}

/// Truncates to `max` characters, backing off to the last line break, and trims
pub fn truncate_at_line(text: &str, max: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max) else {
        return text.trim().to_string();
    };

    let head = &text[..cut];
    let head = match head.rfind('\n') {
        Some(newline) => &head[..newline],
        None => head,
    };
    head.trim().to_string()
}

fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return rest;
        }
    }
    trimmed
}

/// True if nothing but list, quote or table markup remains
fn is_markup_only(line: &str) -> bool {
    line.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '+' | '|' | '>'))
        .is_empty()
}

/// Joins lines, keeping at most one blank line in a row and none at the ends
fn collapse_blank_lines(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());

    for line in lines {
        let blank = line.trim().is_empty();
        if blank && out.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        out.push(if blank { "" } else { line.as_str() });
    }

    while out.last().map_or(false, |last| last.is_empty()) {
        out.pop();
    }

    out.join("\n")
}
