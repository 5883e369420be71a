//! Sitemap XML parsing

use crate::sitemap::SitemapEntry;
use crate::url::normalize_url;
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Cursor;

/// Contents of one sitemap document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSitemap {
    /// `<url>` entries with an http(s) location
    pub entries: Vec<SitemapEntry>,
    /// `<sitemap>` locations from a sitemap index
    pub children: Vec<String>,
}

/// Parses a `<urlset>` or `<sitemapindex>` document
///
/// Entries without a usable http(s) location are skipped. Malformed XML
/// yields whatever was read before the error.
pub fn parse_sitemap(xml: &str) -> ParsedSitemap {
    let mut parsed = ParsedSitemap::default();
    let reader = SiteMapReader::new(Cursor::new(xml.as_bytes()));

    for entity in reader {
        match entity {
            SiteMapEntity::Url(url_entry) => {
                let Some(loc) = url_entry.loc.get_url() else {
                    continue;
                };
                let Ok(url) = normalize_url(loc.as_str()) else {
                    continue;
                };
                parsed.entries.push(SitemapEntry {
                    url: url.to_string(),
                    lastmod: url_entry.lastmod.get_time(),
                    priority: url_entry.priority.get_priority(),
                });
            }
            SiteMapEntity::SiteMap(sitemap_entry) => {
                if let Some(loc) = sitemap_entry.loc.get_url() {
                    parsed.children.push(loc.to_string());
                }
            }
            SiteMapEntity::Err(e) => {
                tracing::debug!("Sitemap parse error: {:?}", e);
            }
        }
    }

    parsed
}
