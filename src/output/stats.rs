//! Statistics derived from a pipeline report
//!
//! Printed to stderr so the JSON report on stdout stays machine-readable.

use crate::output::PipelineReport;
use std::collections::BTreeMap;

/// Aggregate counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStatistics {
    pub total_pages: usize,

    pub succeeded: usize,

    pub failed: usize,

    /// Successful pages whose content came from the browser
    pub js_rendered: usize,

    /// Failed pages grouped by error kind (the part before any colon)
    pub errors_by_kind: BTreeMap<String, usize>,

    /// Number of pages per HTTP status; 0 means no response
    pub pages_by_status: BTreeMap<u16, usize>,
}

impl ReportStatistics {
    /// Computes statistics from a report
    pub fn from_report(report: &PipelineReport) -> Self {
        let mut stats = Self {
            total_pages: report.total_pages,
            succeeded: report.pages_processed,
            failed: report.pages_failed,
            ..Self::default()
        };

        for page in &report.pages {
            *stats.pages_by_status.entry(page.fetch_status).or_insert(0) += 1;

            match &page.error {
                Some(error) => {
                    let kind = error.split(':').next().unwrap_or(error).trim().to_string();
                    *stats.errors_by_kind.entry(kind).or_insert(0) += 1;
                }
                None if page.is_js_rendered => stats.js_rendered += 1,
                None => {}
            }
        }

        stats
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to summarize
pub fn print_statistics(report: &PipelineReport) {
    let stats = ReportStatistics::from_report(report);

    eprintln!("=== Site Digest ===\n");

    eprintln!("Overview:");
    eprintln!("  Start URL: {}", report.start_url);
    eprintln!("  Discovery source: {}", report.discovery_source);
    eprintln!("  Total pages: {}", stats.total_pages);
    eprintln!("  Processed: {}", stats.succeeded);
    eprintln!("  Failed: {}", stats.failed);
    eprintln!("  Rendered in browser: {}", stats.js_rendered);
    eprintln!();

    if !stats.pages_by_status.is_empty() {
        eprintln!("Pages by Status:");
        for (status, count) in &stats.pages_by_status {
            let label = if *status == 0 {
                "no response".to_string()
            } else {
                status.to_string()
            };
            let percentage = if stats.total_pages > 0 {
                (*count as f64 / stats.total_pages as f64) * 100.0
            } else {
                0.0
            };
            eprintln!("  {}: {} ({:.1}%)", label, count, percentage);
        }
        eprintln!();
    }

    if !stats.errors_by_kind.is_empty() {
        eprintln!("Errors:");
        let mut errors: Vec<_> = stats.errors_by_kind.iter().collect();
        errors.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in errors {
            eprintln!("  {}: {}", kind, count);
        }
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ExtractedPage;
    use crate::PageError;

    #[test]
    fn test_statistics_group_errors() {
        let pages = vec![
            ExtractedPage {
                url: "https://a.com/".to_string(),
                fetch_status: 200,
                is_js_rendered: true,
                ..ExtractedPage::default()
            },
            ExtractedPage::failed(
                "https://a.com/x",
                200,
                &PageError::SoftNotFound {
                    signal: "page not found".to_string(),
                },
            ),
            ExtractedPage::failed(
                "https://a.com/y",
                200,
                &PageError::SoftNotFound {
                    signal: "access denied".to_string(),
                },
            ),
            ExtractedPage::failed("https://a.com/z", 0, &PageError::Transport("Connection failed".to_string())),
        ];
        let report = PipelineReport::new("https://a.com/", "crawled", pages);

        let stats = ReportStatistics::from_report(&report);

        assert_eq!(stats.total_pages, 4);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.js_rendered, 1);
        assert_eq!(stats.errors_by_kind.get("Soft 404 detected"), Some(&2));
        assert_eq!(stats.errors_by_kind.get("Connection failed"), Some(&1));
        assert_eq!(stats.pages_by_status.get(&200), Some(&3));
        assert_eq!(stats.pages_by_status.get(&0), Some(&1));
    }
}
