//! PDF rasterisation: render selected pages to JPEG files via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Why files, not in-memory images?
//!
//! Every page image gets uploaded to the Files API before generation, and the
//! upload reads from disk. Rendering straight into the orchestrator's scratch
//! directory keeps peak memory at one page regardless of book length, and the
//! scratch directory is reclaimed in one sweep when the run ends.
//!
//! ## Page keying
//!
//! A [`PageImage`] carries its 1-indexed page `number`; nothing downstream
//! ever derives ordering from filenames, so `page_2.jpg` sorting lexically
//! after `page_10.jpg` can never reorder a book.

use crate::error::{NaskhError, PageError};
use crate::output::SourceSummary;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One rasterised page on disk.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed source page number.
    pub number: usize,
    /// JPEG file inside the run's scratch directory.
    pub path: PathBuf,
}

/// Rasterise pages `start..=end` (1-indexed, inclusive, already normalised)
/// into `scratch`, bounding the longest edge by `max_pixels`.
///
/// Returns one entry per page in page order. A page that fails to render
/// yields `Err(PageError::RenderFailed)` and the remaining pages still
/// render; only document-level failures (unreadable source, no pdfium)
/// abort the call.
pub async fn rasterize_range(
    pdf_path: &Path,
    scratch: &Path,
    max_pixels: u32,
    start: usize,
    end: usize,
) -> Result<Vec<Result<PageImage, PageError>>, NaskhError> {
    let path = pdf_path.to_path_buf();
    let scratch = scratch.to_path_buf();

    tokio::task::spawn_blocking(move || {
        rasterize_range_blocking(&path, &scratch, max_pixels, start, end)
    })
    .await
    .map_err(|e| NaskhError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn rasterize_range_blocking(
    pdf_path: &Path,
    scratch: &Path,
    max_pixels: u32,
    start: usize,
    end: usize,
) -> Result<Vec<Result<PageImage, PageError>>, NaskhError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(end.saturating_sub(start) + 1);

    for number in start..=end {
        results.push(render_one(
            &pages,
            &render_config,
            scratch,
            number,
            total_pages,
        ));
    }

    Ok(results)
}

/// Render a single 1-indexed page to `scratch/page_{n}.jpg`.
fn render_one(
    pages: &PdfPages,
    render_config: &PdfRenderConfig,
    scratch: &Path,
    number: usize,
    total_pages: usize,
) -> Result<PageImage, PageError> {
    if number == 0 || number > total_pages {
        return Err(PageError::RenderFailed {
            page: number,
            detail: format!("page out of range (document has {} pages)", total_pages),
        });
    }

    let page = pages
        .get((number - 1) as u16)
        .map_err(|e| PageError::RenderFailed {
            page: number,
            detail: format!("{:?}", e),
        })?;

    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| PageError::RenderFailed {
            page: number,
            detail: format!("{:?}", e),
        })?;

    // The JPEG encoder rejects RGBA; pdfium bitmaps carry an alpha channel.
    let image = bitmap.as_image().to_rgb8();
    let path = scratch.join(format!("page_{}.jpg", number));
    image
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .map_err(|e| PageError::RenderFailed {
            page: number,
            detail: format!("saving JPEG: {}", e),
        })?;

    debug!(
        "Rendered page {} → {}x{} px → {}",
        number,
        image.width(),
        image.height(),
        path.display()
    );

    Ok(PageImage { number, path })
}

/// Page count of a PDF without rendering anything.
pub async fn page_count(pdf_path: &Path) -> Result<usize, NaskhError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, &path)?;
        Ok(document.pages().len() as usize)
    })
    .await
    .map_err(|e| NaskhError::Internal(format!("Page-count task panicked: {}", e)))?
}

/// Document facts (page count, Title/Author metadata) without rendering.
pub async fn source_summary(pdf_path: &Path) -> Result<SourceSummary, NaskhError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || source_summary_blocking(&path))
        .await
        .map_err(|e| NaskhError::Internal(format!("Summary task panicked: {}", e)))?
}

/// Blocking implementation of [`source_summary`].
fn source_summary_blocking(pdf_path: &Path) -> Result<SourceSummary, NaskhError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path)?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(SourceSummary {
        page_count: pages.len() as usize,
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        pdf_version: format!("{:?}", document.version()),
    })
}

/// Bind to a pdfium shared library: one next to the executable first,
/// then the system-wide copy.
fn bind_pdfium() -> Result<Pdfium, NaskhError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| NaskhError::PdfiumBindingFailed(format!("{:?}", e)))
}

/// Open a PDF, mapping pdfium errors onto the source-unreadable taxonomy.
fn open_document<'a>(pdfium: &'a Pdfium, pdf_path: &Path) -> Result<PdfDocument<'a>, NaskhError> {
    pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            NaskhError::EncryptedPdf {
                path: pdf_path.to_path_buf(),
            }
        } else {
            NaskhError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}
