//! Error types for the naskh library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`NaskhError`] — **Fatal**: the conversion cannot proceed at all
//!   (bad input file, backwards page range, no credential anywhere).
//!   Returned as `Err(NaskhError)` from the top-level `convert*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (render glitch,
//!   upload rejected, unusable model reply) but all other pages are fine.
//!   Stored inside [`crate::output::PageReport`] so callers can inspect
//!   partial success rather than losing the whole book to one bad page.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! page failure, log and continue, or collect all errors for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the naskh library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum NaskhError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF is password-protected; encrypted sources are not supported.
    #[error("PDF '{path}' is encrypted.\nDecrypt it first: qpdf --decrypt --password=<PW> input.pdf output.pdf")]
    EncryptedPdf { path: PathBuf },

    // ── Range errors ──────────────────────────────────────────────────────
    /// After normalisation the requested range starts past where it ends.
    #[error("Invalid page range: start {start} is past end {end}")]
    InvalidRange { start: usize, end: usize },

    // ── Credential errors ─────────────────────────────────────────────────
    /// No API key in the config and none in the environment.
    #[error("No Gemini API key configured.\nPass one explicitly or set GEMINI_API_KEY (or API_KEY) in the environment.")]
    MissingApiKey,

    // ── Output errors ─────────────────────────────────────────────────────
    /// Every selected page failed; the output would be empty.
    #[error("All {total} pages failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// Finalising an output document that holds no blocks.
    #[error("Refusing to serialise an empty document: no page produced any paragraph")]
    EmptyDocument,

    /// docx serialisation failed.
    #[error("Failed to build the Word document: {detail}")]
    DocumentBuildFailed { detail: String },

    /// An existing .docx could not be opened for editing.
    #[error("Failed to read Word document '{path}': {detail}")]
    DocumentReadFailed { path: PathBuf, detail: String },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
naskh renders pages through PDFium and needs its shared library.\n\
  • Place libpdfium next to the executable, or\n\
  • install it system-wide (e.g. apt install libpdfium / brew install pdfium-binaries).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageReport`] when a page fails.
/// The overall conversion continues unless ALL pages fail.
///
/// The variant names the stage that failed: [`PageError::RenderFailed`]
/// during rasterising, the other three during extraction.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The page image never reached the model service.
    #[error("Page {page}: image upload failed: {detail}")]
    UploadFailed { page: usize, detail: String },

    /// The model call failed or returned no usable text.
    #[error("Page {page}: generation failed: {detail}")]
    GenerationFailed { page: usize, detail: String },

    /// The model replied with something neither response shape accepts.
    #[error("Page {page}: unparseable response: {detail}")]
    UnparseableResponse { page: usize, detail: String },
}

impl PageError {
    /// Source page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. }
            | PageError::UploadFailed { page, .. }
            | PageError::GenerationFailed { page, .. }
            | PageError::UnparseableResponse { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_range_display() {
        let e = NaskhError::InvalidRange { start: 9, end: 4 };
        let msg = e.to_string();
        assert!(msg.contains("start 9"), "got: {msg}");
        assert!(msg.contains("end 4"), "got: {msg}");
    }

    #[test]
    fn all_pages_failed_display() {
        let e = NaskhError::AllPagesFailed {
            total: 7,
            first_error: "Page 1: image upload failed: connection reset".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("All 7 pages failed"), "got: {msg}");
        assert!(msg.contains("connection reset"), "got: {msg}");
    }

    #[test]
    fn missing_api_key_mentions_env_vars() {
        let msg = NaskhError::MissingApiKey.to_string();
        assert!(msg.contains("GEMINI_API_KEY"));
        assert!(msg.contains("API_KEY"));
    }

    #[test]
    fn upload_failed_display() {
        let e = PageError::UploadFailed {
            page: 3,
            detail: "HTTP 503".into(),
        };
        assert!(e.to_string().contains("Page 3"));
        assert!(e.to_string().contains("HTTP 503"));
    }

    #[test]
    fn page_error_reports_its_page() {
        let e = PageError::GenerationFailed {
            page: 12,
            detail: "empty candidates".into(),
        };
        assert_eq!(e.page(), 12);
    }
}
