//! Output module for pipeline reports
//!
//! This module handles:
//! - Assembling the job report from extracted pages
//! - Writing the report as JSON
//! - Summarizing outcomes for the terminal

pub mod stats;

pub use stats::{print_statistics, ReportStatistics};

use crate::page::ExtractedPage;
use crate::DigestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Normalized start URL
    pub start_url: String,

    /// Sitemap URL the pages came from, `crawled` or `homepage`
    pub discovery_source: String,

    pub total_pages: usize,

    /// Pages extracted without error
    pub pages_processed: usize,

    pub pages_failed: usize,

    pub generated_at: DateTime<Utc>,

    /// One entry per discovered page, in discovery order
    pub pages: Vec<ExtractedPage>,
}

impl PipelineReport {
    /// Builds a report and computes its counters
    pub fn new(
        start_url: impl Into<String>,
        discovery_source: impl Into<String>,
        pages: Vec<ExtractedPage>,
    ) -> Self {
        let pages_failed = pages.iter().filter(|p| !p.is_success()).count();

        Self {
            start_url: start_url.into(),
            discovery_source: discovery_source.into(),
            total_pages: pages.len(),
            pages_processed: pages.len() - pages_failed,
            pages_failed,
            generated_at: Utc::now(),
            pages,
        }
    }

    /// Pages extracted without error
    pub fn successful_pages(&self) -> impl Iterator<Item = &ExtractedPage> {
        self.pages.iter().filter(|p| p.is_success())
    }

    /// Writes the report as pretty-printed JSON
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), DigestError> {
        let mut writer = writer;
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Writes the report to a file, replacing any existing one
    pub fn save(&self, path: &Path) -> Result<(), DigestError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_json(&mut writer)?;
        writer.flush()?;
        tracing::info!("Report written to {}", path.display());
        Ok(())
    }
}
