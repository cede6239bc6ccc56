//! Full-document conversion entry points.
//!
//! This module owns the run loop: validate the source, resolve the model and
//! pacing policy, rasterise the selected range, then walk the pages strictly
//! in order and assemble whatever survived into a Word document. Per-page
//! failures are recorded in the output report and never abort the run; only
//! systemic problems (unreadable source, missing credentials, nothing
//! produced at all) surface as errors.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::ConversionConfig;
use crate::error::{NaskhError, PageError};
use crate::gemini::GeminiModel;
use crate::output::{ConversionOutput, PageReport, RunStats, SourceSummary};
use crate::pacing::{FixedPacer, Pacer};
use crate::pipeline::assemble::Assembler;
use crate::pipeline::extract::{self, VisionModel};
use crate::pipeline::format::{self, Block};
use crate::pipeline::rasterize::{self, PageImage};
use crate::progress::{ConversionProgress, NoopProgress};
use crate::prompts;

/// Page cap applied to runs without a caller-supplied API key.
const FREE_TIER_PAGE_CAP: usize = 10;

/// Environment variables consulted for a Gemini API key, most specific first.
const KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Convert a scanned Arabic book PDF into a Word document.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — path to a local PDF file
/// * `config` — conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some pages failed
/// (check `output.stats.failed_pages`).
///
/// # Errors
/// Returns `Err(NaskhError)` only for fatal errors:
/// - file not found / permission denied / not a PDF
/// - no API key anywhere and no custom model client
/// - page range empty after normalisation
/// - every selected page failed
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, NaskhError> {
    let total_start = Instant::now();
    let pdf_path = resolve_source(input.as_ref())?;
    info!("Starting conversion: {}", pdf_path.display());

    // ── Step 1: Resolve collaborators ────────────────────────────────────
    let model = resolve_model(config)?;
    let pacer = resolve_pacer(config);
    let progress = resolve_progress(config);
    let prompt = config
        .prompt_override
        .as_deref()
        .unwrap_or(prompts::ZONE_EXTRACTION_PROMPT);

    // ── Step 2: Pick the page range ──────────────────────────────────────
    let total_pages = rasterize::page_count(&pdf_path).await?;
    info!("PDF has {} pages", total_pages);
    let (start, end) = select_range(config, total_pages)?;
    let selected = end - start + 1;
    debug!(
        "Selected pages {}..={} ({} of {})",
        start, end, selected, total_pages
    );

    // Fire on_start now that the page count is known, before the render
    // stage makes the caller wait.
    progress.on_start(selected);

    // ── Step 3: Rasterise ────────────────────────────────────────────────
    // The scratch directory must outlive extraction: the model client reads
    // each JPEG back from disk when it uploads.
    let scratch = tempfile::tempdir()
        .map_err(|e| NaskhError::Internal(format!("Failed to create scratch directory: {}", e)))?;
    let render_start = Instant::now();
    let rendered = rasterize::rasterize_range(
        &pdf_path,
        scratch.path(),
        config.max_rendered_pixels,
        start,
        end,
    )
    .await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages in {}ms",
        rendered.len(),
        render_duration_ms
    );

    // ── Step 4: Extract, format, accumulate — strictly in order ──────────
    let extract_start = Instant::now();
    let (pages, assembler) = run_pages(
        model.as_ref(),
        pacer.as_ref(),
        progress.as_ref(),
        config,
        prompt,
        rendered,
    )
    .await;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    // ── Step 5: Assemble and account ─────────────────────────────────────
    let processed = pages.iter().filter(|p| p.appended()).count();
    let failed = pages.len() - processed;
    progress.on_finish(processed, failed);

    if processed == 0 {
        let first_error = pages
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no pages were selected".to_string());
        return Err(NaskhError::AllPagesFailed {
            total: pages.len(),
            first_error,
        });
    }

    let document = assembler.finish()?;

    let stats = RunStats {
        total_pages,
        selected_pages: selected,
        processed_pages: processed,
        failed_pages: failed,
        total_prompt_tokens: pages.iter().map(|p| u64::from(p.prompt_tokens)).sum(),
        total_output_tokens: pages.iter().map(|p| u64::from(p.output_tokens)).sum(),
        render_duration_ms,
        extract_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages, {} bytes, {}ms total",
        processed,
        selected,
        document.len(),
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        document,
        pages,
        stats,
    })
}

/// Convert a PDF and write the document directly to a file.
///
/// Uses an atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RunStats, NaskhError> {
    let output = convert(input, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| NaskhError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, &output.document)
        .await
        .map_err(|e| NaskhError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| NaskhError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, NaskhError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| NaskhError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

/// Summarise a PDF (page count, title, author) without converting it.
///
/// Does not require a model client or API key.
pub async fn inspect(input: impl AsRef<Path>) -> Result<SourceSummary, NaskhError> {
    let pdf_path = resolve_source(input.as_ref())?;
    rasterize::source_summary(&pdf_path).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Validate that `input` names a readable PDF file.
///
/// Reads just the magic bytes. pdfium reports a generic load failure for
/// non-PDF input, so checking `%PDF` up front turns "corrupt document" into
/// a precise message about the actual file.
fn resolve_source(input: &Path) -> Result<PathBuf, NaskhError> {
    let mut file = match std::fs::File::open(input) {
        Ok(file) => file,
        Err(err) => {
            return Err(match err.kind() {
                std::io::ErrorKind::NotFound => NaskhError::FileNotFound {
                    path: input.to_path_buf(),
                },
                std::io::ErrorKind::PermissionDenied => NaskhError::PermissionDenied {
                    path: input.to_path_buf(),
                },
                _ => NaskhError::Internal(format!(
                    "Failed to open {}: {}",
                    input.display(),
                    err
                )),
            });
        }
    };

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
        return Err(NaskhError::NotAPdf {
            path: input.to_path_buf(),
            magic,
        });
    }
    Ok(input.to_path_buf())
}

/// Resolve the vision model, from most specific to least specific.
///
/// 1. **Pre-built client** (`config.model_client`) — the caller constructed
///    and configured the client entirely; we use it as-is. Useful in tests
///    or when the caller wraps the client in middleware.
///
/// 2. **Caller key** (`config.api_key`) — builds a Gemini client; this is
///    also what marks the run paid-tier.
///
/// 3. **Environment key** (`GEMINI_API_KEY`, then `API_KEY`) — builds the
///    same client, but the run keeps free-tier limits: the key was ambient,
///    not an explicit opt-in from the caller.
fn resolve_model(config: &ConversionConfig) -> Result<Arc<dyn VisionModel>, NaskhError> {
    if let Some(ref client) = config.model_client {
        return Ok(Arc::clone(client));
    }

    let key = config
        .api_key
        .clone()
        .or_else(env_api_key)
        .ok_or(NaskhError::MissingApiKey)?;
    let model = GeminiModel::new(
        key,
        &config.model,
        Duration::from_secs(config.api_timeout_secs),
    )?;
    Ok(Arc::new(model))
}

fn env_api_key() -> Option<String> {
    KEY_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Resolve the pacing policy: an explicit pacer wins, otherwise the tier
/// decides. Only a caller-supplied key counts as paid; an environment key
/// authenticates the requests but keeps free-tier pacing.
fn resolve_pacer(config: &ConversionConfig) -> Arc<dyn Pacer> {
    config
        .pacer
        .clone()
        .unwrap_or_else(|| Arc::new(FixedPacer::for_tier(config.api_key.is_some())))
}

fn resolve_progress(config: &ConversionConfig) -> Arc<dyn ConversionProgress> {
    config
        .progress
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgress))
}

/// Normalise the configured range against the document, then apply the
/// free-tier page cap when the caller supplied no API key.
fn select_range(
    config: &ConversionConfig,
    total_pages: usize,
) -> Result<(usize, usize), NaskhError> {
    let (start, end) = normalize_range(config.start_page, config.end_page, total_pages)?;
    if config.api_key.is_some() {
        return Ok((start, end));
    }
    let capped = end.min(start + FREE_TIER_PAGE_CAP - 1);
    if capped < end {
        warn!(
            "No API key supplied: free tier processes at most {} pages, stopping at page {}",
            FREE_TIER_PAGE_CAP, capped
        );
    }
    Ok((start, capped))
}

/// Clamp a 1-indexed inclusive page range to the document.
///
/// `end == 0` and any end past the document both mean "through the last
/// page". The range is invalid only when the normalised start lands past
/// the normalised end.
fn normalize_range(
    start_page: usize,
    end_page: usize,
    total_pages: usize,
) -> Result<(usize, usize), NaskhError> {
    let start = start_page.max(1);
    let end = if end_page == 0 || end_page > total_pages {
        total_pages
    } else {
        end_page
    };
    if start > end {
        return Err(NaskhError::InvalidRange { start, end });
    }
    Ok((start, end))
}

/// Walk the rendered pages in order: extract, format, accumulate.
///
/// Returns one report per selected page plus the loaded assembler. Page
/// breaks key on the page's 1-based position in the selection, which
/// advances across failures: a failed page contributes no blocks of its
/// own, and the next surviving page still leads with the break that marks
/// its boundary, so pagination follows the source.
async fn run_pages(
    model: &dyn VisionModel,
    pacer: &dyn Pacer,
    progress: &dyn ConversionProgress,
    config: &ConversionConfig,
    prompt: &str,
    rendered: Vec<Result<PageImage, PageError>>,
) -> (Vec<PageReport>, Assembler) {
    let total = rendered.len();
    let mut reports = Vec::with_capacity(total);
    let mut assembler = Assembler::new();

    for (index, entry) in rendered.into_iter().enumerate() {
        let ordinal = index + 1;
        let page_start = Instant::now();

        let page = match entry {
            Ok(page) => page,
            Err(error) => {
                // No image, no remote call, so the pacing delay does not
                // apply either.
                warn!("Page {} skipped: {}", error.page(), error);
                progress.on_page_failed(error.page(), &error);
                reports.push(PageReport {
                    page: error.page(),
                    ordinal,
                    paragraphs: 0,
                    prompt_tokens: 0,
                    output_tokens: 0,
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    error: Some(error),
                });
                continue;
            }
        };

        progress.on_page_start(page.number, ordinal, total);
        match extract::extract_page(model, &page, prompt).await {
            Ok(extraction) => {
                let blocks = format::format_page(ordinal, &extraction.content, config);
                let paragraphs = blocks
                    .iter()
                    .filter(|b| matches!(b, Block::Paragraph(_)))
                    .count();
                assembler.append_page(blocks);
                debug!("Page {}: {} paragraphs", page.number, paragraphs);
                progress.on_page_done(page.number, paragraphs);
                reports.push(PageReport {
                    page: page.number,
                    ordinal,
                    paragraphs,
                    prompt_tokens: extraction.prompt_tokens,
                    output_tokens: extraction.output_tokens,
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    error: None,
                });
            }
            Err(error) => {
                warn!("Page {} failed: {}", page.number, error);
                progress.on_page_failed(page.number, &error);
                reports.push(PageReport {
                    page: page.number,
                    ordinal,
                    paragraphs: 0,
                    prompt_tokens: 0,
                    output_tokens: 0,
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    error: Some(error),
                });
            }
        }

        // The remote quota meters requests, not successes, so failed calls
        // pace too. The final page needs no trailing delay.
        if ordinal < total {
            tokio::time::sleep(pacer.page_delay()).await;
        }
    }

    (reports, assembler)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};

    use super::*;
    use crate::pacing::{FREE_TIER_DELAY, PAID_TIER_DELAY};
    use crate::pipeline::extract::ModelReply;

    /// Replays a scripted sequence of replies, one per call.
    struct FakeModel {
        replies: Mutex<VecDeque<Result<ModelReply, PageError>>>,
    }

    impl FakeModel {
        fn new(replies: Vec<Result<ModelReply, PageError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }

        fn text(s: &str) -> Result<ModelReply, PageError> {
            Ok(ModelReply {
                text: s.to_string(),
                prompt_tokens: 100,
                output_tokens: 40,
            })
        }
    }

    #[async_trait]
    impl VisionModel for FakeModel {
        async fn transcribe(
            &self,
            page: &PageImage,
            _prompt: &str,
        ) -> Result<ModelReply, PageError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(PageError::GenerationFailed {
                        page: page.number,
                        detail: "script exhausted".into(),
                    })
                })
        }
    }

    /// Counts calls and never sleeps.
    struct CountingPacer(AtomicUsize);

    impl Pacer for CountingPacer {
        fn page_delay(&self) -> Duration {
            self.0.fetch_add(1, Ordering::SeqCst);
            Duration::ZERO
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgress for RecordingProgress {
        fn on_page_start(&self, page: usize, _ordinal: usize, _total: usize) {
            self.events.lock().unwrap().push(format!("start {page}"));
        }
        fn on_page_done(&self, page: usize, paragraphs: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {page} ({paragraphs})"));
        }
        fn on_page_failed(&self, page: usize, _error: &PageError) {
            self.events.lock().unwrap().push(format!("failed {page}"));
        }
    }

    fn image(number: usize) -> Result<PageImage, PageError> {
        Ok(PageImage {
            number,
            path: PathBuf::from("unused.jpg"),
        })
    }

    fn paragraph_texts(bytes: &[u8]) -> Vec<String> {
        let docx = read_docx(bytes).unwrap();
        docx.document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => {
                    let mut text = String::new();
                    for pc in &p.children {
                        if let ParagraphChild::Run(run) = pc {
                            for rc in &run.children {
                                if let RunChild::Text(t) = rc {
                                    text.push_str(&t.text);
                                }
                            }
                        }
                    }
                    Some(text)
                }
                _ => None,
            })
            .collect()
    }

    // ── Range selection ─────────────────────────────────────────────────

    #[test]
    fn range_defaults_to_whole_document() {
        assert_eq!(normalize_range(1, 0, 5).unwrap(), (1, 5));
    }

    #[test]
    fn range_end_clamps_to_document() {
        assert_eq!(normalize_range(3, 99, 5).unwrap(), (3, 5));
    }

    #[test]
    fn range_start_clamps_up_to_one() {
        assert_eq!(normalize_range(0, 0, 5).unwrap(), (1, 5));
    }

    #[test]
    fn range_start_past_document_is_invalid() {
        assert!(matches!(
            normalize_range(7, 0, 5),
            Err(NaskhError::InvalidRange { start: 7, end: 5 })
        ));
    }

    #[test]
    fn range_inverted_is_invalid() {
        assert!(matches!(
            normalize_range(4, 2, 10),
            Err(NaskhError::InvalidRange { start: 4, end: 2 })
        ));
    }

    #[test]
    fn free_tier_caps_the_selection() {
        let config = ConversionConfig::default();
        assert_eq!(select_range(&config, 50).unwrap(), (1, 10));

        let from_five = ConversionConfig {
            start_page: 5,
            ..Default::default()
        };
        assert_eq!(select_range(&from_five, 50).unwrap(), (5, 14));
    }

    #[test]
    fn free_tier_cap_never_extends_the_range() {
        let config = ConversionConfig::default();
        assert_eq!(select_range(&config, 3).unwrap(), (1, 3));
    }

    #[test]
    fn caller_key_lifts_the_cap() {
        let config = ConversionConfig {
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert_eq!(select_range(&config, 50).unwrap(), (1, 50));
    }

    // ── Collaborator resolution ─────────────────────────────────────────

    #[test]
    fn custom_model_client_is_used_as_is() {
        let client: Arc<dyn VisionModel> = Arc::new(FakeModel::new(vec![]));
        let config = ConversionConfig {
            model_client: Some(Arc::clone(&client)),
            ..Default::default()
        };
        let resolved = resolve_model(&config).unwrap();
        assert!(Arc::ptr_eq(&resolved, &client));
    }

    #[test]
    fn pacer_follows_the_tier() {
        let free = ConversionConfig::default();
        assert_eq!(resolve_pacer(&free).page_delay(), FREE_TIER_DELAY);

        let paid = ConversionConfig {
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert_eq!(resolve_pacer(&paid).page_delay(), PAID_TIER_DELAY);
    }

    #[test]
    fn explicit_pacer_wins_over_tier() {
        let config = ConversionConfig {
            api_key: Some("k".into()),
            pacer: Some(Arc::new(FixedPacer::new(Duration::from_millis(1)))),
            ..Default::default()
        };
        assert_eq!(resolve_pacer(&config).page_delay(), Duration::from_millis(1));
    }

    // ── The run loop ────────────────────────────────────────────────────

    #[tokio::test]
    async fn failed_page_is_skipped_without_shifting_breaks() {
        let model = FakeModel::new(vec![
            Err(PageError::GenerationFailed {
                page: 1,
                detail: "timeout".into(),
            }),
            FakeModel::text("الصفحة الثانية"),
        ]);
        let pacer = CountingPacer(AtomicUsize::new(0));
        let progress = RecordingProgress::default();
        let config = ConversionConfig::default();

        let (reports, assembler) = run_pages(
            &model,
            &pacer,
            &progress,
            &config,
            "p",
            vec![image(1), image(2)],
        )
        .await;

        assert_eq!(reports.len(), 2);
        assert!(reports[0].error.is_some());
        assert!(reports[1].appended());
        assert_eq!(reports[1].paragraphs, 1);
        assert_eq!(reports[1].prompt_tokens, 100);

        // Break keying follows the processing position, not the count of
        // surviving pages: page 2 still opens behind its break even though
        // page 1 contributed nothing.
        let texts = paragraph_texts(&assembler.finish().unwrap());
        assert_eq!(
            texts,
            vec![String::new(), "الصفحة الثانية".to_string()]
        );
    }

    #[tokio::test]
    async fn surviving_pages_keep_their_breaks() {
        let model = FakeModel::new(vec![
            FakeModel::text("الأولى"),
            Err(PageError::UploadFailed {
                page: 2,
                detail: "HTTP 503".into(),
            }),
            FakeModel::text("الثالثة"),
        ]);
        let pacer = CountingPacer(AtomicUsize::new(0));
        let progress = RecordingProgress::default();
        let config = ConversionConfig::default();

        let (reports, assembler) = run_pages(
            &model,
            &pacer,
            &progress,
            &config,
            "p",
            vec![image(1), image(2), image(3)],
        )
        .await;

        assert_eq!(reports.iter().filter(|r| r.appended()).count(), 2);
        // One break between the two surviving pages, rendered as an empty
        // paragraph holding the break run.
        let texts = paragraph_texts(&assembler.finish().unwrap());
        assert_eq!(
            texts,
            vec!["الأولى".to_string(), String::new(), "الثالثة".to_string()]
        );
    }

    #[tokio::test]
    async fn pacing_skips_render_failures_and_the_last_page() {
        let model = FakeModel::new(vec![FakeModel::text("أ"), FakeModel::text("ب")]);
        let pacer = CountingPacer(AtomicUsize::new(0));
        let progress = RecordingProgress::default();
        let config = ConversionConfig::default();

        let rendered = vec![
            Err(PageError::RenderFailed {
                page: 1,
                detail: "rasterisation failed".into(),
            }),
            image(2),
            image(3),
        ];
        let (reports, _) = run_pages(&model, &pacer, &progress, &config, "p", rendered).await;

        assert_eq!(reports.len(), 3);
        // Page 1 made no remote call; page 3 was last. Only page 2 paces.
        assert_eq!(pacer.0.load(Ordering::SeqCst), 1);

        let events = progress.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "failed 1".to_string(),
                "start 2".to_string(),
                "done 2 (1)".to_string(),
                "start 3".to_string(),
                "done 3 (1)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn failed_remote_calls_still_pace() {
        let model = FakeModel::new(vec![
            Err(PageError::GenerationFailed {
                page: 1,
                detail: "quota".into(),
            }),
            FakeModel::text("ب"),
        ]);
        let pacer = CountingPacer(AtomicUsize::new(0));
        let progress = RecordingProgress::default();
        let config = ConversionConfig::default();

        let (_, _) = run_pages(
            &model,
            &pacer,
            &progress,
            &config,
            "p",
            vec![image(1), image(2)],
        )
        .await;

        assert_eq!(pacer.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zoned_reply_respects_config_gates() {
        let zoned = r#"{"header": "الكتاب", "heading": "الباب", "main_content": "المتن", "footnotes": "حاشية", "footer": "٩"}"#;
        let model = FakeModel::new(vec![FakeModel::text(zoned)]);
        let pacer = CountingPacer(AtomicUsize::new(0));
        let progress = RecordingProgress::default();
        let config = ConversionConfig::default();

        let (reports, assembler) =
            run_pages(&model, &pacer, &progress, &config, "p", vec![image(1)]).await;

        assert_eq!(reports[0].paragraphs, 2);
        let texts = paragraph_texts(&assembler.finish().unwrap());
        assert_eq!(texts, vec!["الباب".to_string(), "المتن".to_string()]);
    }

    #[tokio::test]
    async fn all_pages_failing_leaves_an_empty_assembler() {
        let model = FakeModel::new(vec![]);
        let pacer = CountingPacer(AtomicUsize::new(0));
        let progress = RecordingProgress::default();
        let config = ConversionConfig::default();

        let (reports, assembler) = run_pages(
            &model,
            &pacer,
            &progress,
            &config,
            "p",
            vec![image(1), image(2)],
        )
        .await;

        assert!(reports.iter().all(|r| !r.appended()));
        assert!(assembler.is_empty());
    }

    // ── Source validation ───────────────────────────────────────────────

    #[test]
    fn missing_file_is_reported_as_such() {
        let err = resolve_source(Path::new("/no/such/file.pdf")).unwrap_err();
        assert!(matches!(err, NaskhError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_bytes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"PK\x03\x04 definitely a zip").unwrap();
        let err = resolve_source(&path).unwrap_err();
        assert!(matches!(err, NaskhError::NotAPdf { .. }));
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.pdf");
        std::fs::write(&path, b"%PDF-1.7\n...").unwrap();
        assert_eq!(resolve_source(&path).unwrap(), path);
    }
}
