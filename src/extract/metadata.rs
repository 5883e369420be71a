//! Page metadata extraction
//!
//! Title and description are resolved through ordered strategy lists; the
//! first strategy returning a non-empty value wins.

use scraper::{Html, Selector};

/// Maximum description length in characters
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Minimum paragraph length before it is used as a description fallback
const MIN_PARAGRAPH_CHARS: usize = 20;

type FieldStrategy = fn(&Html) -> Option<String>;

const TITLE_STRATEGIES: &[FieldStrategy] = &[title_element, first_heading];

const DESCRIPTION_STRATEGIES: &[FieldStrategy] =
    &[meta_description, og_description, first_substantial_paragraph];

/// Metadata read from a page's head and first content elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_type: Option<String>,
    pub og_image: Option<String>,
}

impl PageMetadata {
    /// True when both a title and a description were found
    pub fn is_usable(&self) -> bool {
        self.title.is_some() && self.description.is_some()
    }
}

/// Extracts all metadata fields from a parsed document
pub fn extract_metadata(document: &Html) -> PageMetadata {
    PageMetadata {
        title: extract_title(document),
        description: extract_description(document),
        og_title: meta_content(document, "og:title"),
        og_description: meta_content(document, "og:description"),
        og_type: meta_content(document, "og:type"),
        og_image: meta_content(document, "og:image"),
    }
}

/// `<title>`, else the first `<h1>`
pub fn extract_title(document: &Html) -> Option<String> {
    TITLE_STRATEGIES.iter().find_map(|strategy| strategy(document))
}

/// Meta description, else `og:description`, else the first paragraph longer
/// than 20 characters; truncated to 500 characters
pub fn extract_description(document: &Html) -> Option<String> {
    DESCRIPTION_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(document))
        .map(|text| truncate_chars(&text, MAX_DESCRIPTION_CHARS))
}

/// Reads a `<meta>` content value, checking `property` before `name`
pub fn meta_content(document: &Html, key: &str) -> Option<String> {
    ["property", "name"].iter().find_map(|attr| {
        let selector = Selector::parse(&format!("meta[{}=\"{}\"]", attr, key)).ok()?;
        document
            .select(&selector)
            .filter_map(|element| element.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    })
}

/// Returns the first non-empty collapsed text of elements matching `css`
fn first_text(document: &Html, css: &str, min_chars: usize) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|text| !text.is_empty() && text.chars().count() > min_chars)
}

fn title_element(document: &Html) -> Option<String> {
    first_text(document, "title", 0)
}

fn first_heading(document: &Html) -> Option<String> {
    first_text(document, "h1", 0)
}

fn meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name=\"description\"]").ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn og_description(document: &Html) -> Option<String> {
    meta_content(document, "og:description")
}

fn first_substantial_paragraph(document: &Html) -> Option<String> {
    first_text(document, "p", MIN_PARAGRAPH_CHARS)
}

/// Joins whitespace runs into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to at most `max` characters without splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
