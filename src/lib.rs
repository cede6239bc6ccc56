//! # naskh
//!
//! Convert scanned Arabic book PDFs to Word documents using a vision
//! language model.
//!
//! ## Why this crate?
//!
//! Traditional OCR mangles Arabic script: connected letterforms, diacritics
//! and right-to-left layout defeat glyph-based engines, and classical
//! editions surround the body text with running heads, footnote blocks and
//! page numbers that bleed into the output. Instead this crate rasterises
//! each page and lets a vision model read it as a human would, splitting the
//! page into its customary zones (running head, chapter heading, body,
//! footnotes, page number) and emitting a Word document that keeps the
//! book's layout: body text right-aligned, headings centred and bold,
//! page breaks where the printed pages break.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Rasterize  render selected pages to JPEG via pdfium (spawn_blocking)
//!  ├─ 2. Extract    one Gemini call per page, strictly in order, paced
//!  ├─ 3. Format     zones / inline markers → aligned paragraph directives
//!  └─ 4. Assemble   directives → .docx bytes + per-page report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use naskh::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Authenticates with GEMINI_API_KEY (or API_KEY) from the environment
//!     let config = ConversionConfig::builder()
//!         .page_range(1, 10)
//!         .build()?;
//!     let output = convert("kitab.pdf", &config).await?;
//!     std::fs::write("kitab.docx", &output.document)?;
//!     eprintln!(
//!         "{} pages, tokens: {} in / {} out",
//!         output.stats.processed_pages,
//!         output.stats.total_prompt_tokens,
//!         output.stats.total_output_tokens
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Free tier
//!
//! Without a caller-supplied API key the converter still authenticates with
//! the `GEMINI_API_KEY` (or `API_KEY`) environment variable, but a run is
//! capped at 10 pages and paced at 15 seconds between calls. Passing a key
//! through [`ConversionConfigBuilder::api_key`] lifts the cap and drops the
//! pause to 3 seconds.
//!
//! ## Editing existing documents
//!
//! [`edit_file`] applies literal find-and-replace pairs to a `.docx` that
//! already exists, matching across Word's arbitrary run splits and inside
//! table cells. See [`edit`] for the splice semantics.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `naskh` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! naskh = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod edit;
pub mod error;
pub mod gemini;
pub mod output;
pub mod pacing;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, convert_to_file, inspect};
pub use edit::{apply_replacements, edit_file, Replacement};
pub use error::{NaskhError, PageError};
pub use gemini::GeminiModel;
pub use output::{ConversionOutput, PageReport, RunStats, SourceSummary};
pub use pacing::{FixedPacer, Pacer};
pub use pipeline::assemble::Assembler;
pub use pipeline::extract::{ExtractedRecord, ModelReply, PageContent, VisionModel};
pub use pipeline::format::{Alignment, Block, Directive};
pub use pipeline::rasterize::PageImage;
pub use progress::{ConversionProgress, NoopProgress};
