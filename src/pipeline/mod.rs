//! Pipeline stages for PDF-to-Word conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different vision model) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! rasterize ──▶ extract ──▶ format ──▶ assemble
//!  (pdfium)      (VLM)     (layout)    (.docx)
//! ```
//!
//! 1. [`rasterize`] — render selected pages to JPEG files; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`extract`]   — send each page image to the vision model and parse its
//!    reply into zoned or flat-markup content; the only stage with network I/O
//! 3. [`format`]    — map zones and inline markers to styled paragraph
//!    directives, applying the caller's strip-set
//! 4. [`assemble`]  — accumulate directives and render the final Word document

pub mod assemble;
pub mod extract;
pub mod format;
pub mod rasterize;
