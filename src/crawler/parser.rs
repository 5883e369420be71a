//! HTML link extraction
//!
//! Pulls candidate navigation targets out of a page for breadth-first
//! discovery.

use crate::url::canonical_url;
use scraper::{Html, Selector};
use url::Url;

/// Extracts normalized absolute link targets from a page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links
/// - Non-HTTP(S) URLs after resolution
///
/// Links are returned in document order without duplicates.
///
/// # Example
///
/// ```
/// use site_digest::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/about/">About</a><a href="mailto:x@a.com">Mail</a></body></html>"#;
/// let base_url = Url::parse("https://a.com/").unwrap();
/// assert_eq!(extract_links(html, &base_url), vec!["https://a.com/about".to_string()]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links: Vec<String> = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(absolute_url) = resolve_link(href, base_url) {
            if !links.contains(&absolute_url) {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only references
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    canonical_url(absolute.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/").unwrap()
    }

    #[test]
    fn test_relative_and_absolute_links() {
        let html = r#"<body>
            <a href="guide">Guide</a>
            <a href="/pricing/">Pricing</a>
            <a href="https://other.com/x">Other</a>
        </body>"#;

        assert_eq!(
            extract_links(html, &base()),
            vec![
                "https://example.com/docs/guide",
                "https://example.com/pricing",
                "https://other.com/x",
            ]
        );
    }

    #[test]
    fn test_skips_special_schemes() {
        let html = r##"<body>
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:a@example.com">Mail</a>
            <a href="tel:+123">Call</a>
            <a href="data:text/plain,hi">Data</a>
            <a href="#top">Top</a>
            <a href="ftp://example.com/file">FTP</a>
        </body>"##;

        assert!(extract_links(html, &base()).is_empty());
    }

    #[test]
    fn test_skips_download_links() {
        let html = r#"<body><a href="/file" download>Get</a><a href="/page">Page</a></body>"#;
        assert_eq!(extract_links(html, &base()), vec!["https://example.com/page"]);
    }

    #[test]
    fn test_fragment_dropped_and_deduplicated() {
        let html = r#"<body><a href="/a#one">One</a><a href="/a#two">Two</a><a href="/a/">Three</a></body>"#;
        assert_eq!(extract_links(html, &base()), vec!["https://example.com/a"]);
    }

    #[test]
    fn test_resolve_link_uppercase_scheme() {
        assert_eq!(resolve_link("MAILTO:x@example.com", &base()), None);
        assert_eq!(resolve_link("  ", &base()), None);
    }
}
