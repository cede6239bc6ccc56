//! Result types returned by the conversion pipeline.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single page, in run order.
///
/// `error: None` means the page went all the way through rasterise →
/// extract → format → append. `Some` names the stage that failed:
/// [`PageError::RenderFailed`] for rasterising, the other variants for
/// extraction. Failed pages contribute nothing to the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed source page number.
    pub page: usize,
    /// 1-indexed position within this run. Drives page-break placement.
    pub ordinal: usize,
    /// Paragraph directives appended for this page.
    pub paragraphs: usize,
    /// Prompt tokens consumed by this page's generation call.
    pub prompt_tokens: u32,
    /// Tokens generated for this page.
    pub output_tokens: u32,
    /// Wall-clock time spent on this page after rendering, in milliseconds.
    pub duration_ms: u64,
    /// None = appended; Some = skipped, with the failing stage's error.
    pub error: Option<PageError>,
}

impl PageReport {
    /// True when the page made it into the output document.
    pub fn appended(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics for one conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages selected after range normalisation and the free-tier cap.
    pub selected_pages: usize,
    /// Pages appended to the output document.
    pub processed_pages: usize,
    /// Pages skipped because a stage failed.
    pub failed_pages: usize,
    pub total_prompt_tokens: u64,
    pub total_output_tokens: u64,
    /// Time spent rasterising, in milliseconds.
    pub render_duration_ms: u64,
    /// Time spent in remote extraction (pacing included), in milliseconds.
    pub extract_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a successful conversion produces.
pub struct ConversionOutput {
    /// The serialised `.docx` file.
    pub document: Vec<u8>,
    /// Per-page outcomes, in run order.
    pub pages: Vec<PageReport>,
    /// Aggregate statistics.
    pub stats: RunStats,
}

impl fmt::Debug for ConversionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionOutput")
            .field("document", &format!("<{} bytes>", self.document.len()))
            .field("pages", &self.pages.len())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Source-document facts reported by [`crate::convert::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSummary {
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub pdf_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_report_roundtrips_through_json() {
        let report = PageReport {
            page: 14,
            ordinal: 2,
            paragraphs: 0,
            prompt_tokens: 0,
            output_tokens: 0,
            duration_ms: 381,
            error: Some(PageError::UnparseableResponse {
                page: 14,
                detail: "unknown field `body`".into(),
            }),
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: PageReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.page, 14);
        assert!(!back.appended());
    }

    #[test]
    fn appended_means_no_error() {
        let report = PageReport {
            page: 1,
            ordinal: 1,
            paragraphs: 7,
            prompt_tokens: 900,
            output_tokens: 412,
            duration_ms: 1920,
            error: None,
        };
        assert!(report.appended());
    }

    #[test]
    fn conversion_output_debug_hides_the_bytes() {
        let out = ConversionOutput {
            document: vec![0u8; 4096],
            pages: vec![],
            stats: RunStats {
                total_pages: 1,
                selected_pages: 1,
                processed_pages: 1,
                failed_pages: 0,
                total_prompt_tokens: 10,
                total_output_tokens: 20,
                render_duration_ms: 5,
                extract_duration_ms: 6,
                total_duration_ms: 12,
            },
        };
        let dbg = format!("{out:?}");
        assert!(dbg.contains("<4096 bytes>"), "got: {dbg}");
    }
}
