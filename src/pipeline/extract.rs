//! Extraction: send a page image to the vision model and parse the reply.
//!
//! ## Why sanitise before parsing?
//!
//! Even well-prompted VLMs occasionally wrap the reply in ` ``` ` fences or
//! scatter stray tokens (a bare language word, a lone `#`) despite the prompt
//! saying not to. The sanitiser applies cheap, deterministic string rules so
//! the parser only ever sees the payload. Keeping the rules here rather than
//! in the prompt means the prompt stays focused on *what to read*, not on
//! formatting edge-cases, and each rule is independently testable.
//!
//! ## Two response shapes
//!
//! Older prompt revisions asked for flat text with inline alignment markers;
//! the current prompt asks for a JSON object with five named page zones.
//! Replies are detected and parsed into [`PageContent`] without the caller
//! ever knowing which shape arrived. A reply that matches neither shape is a
//! per-page [`PageError::UnparseableResponse`], not a fatal error.

use crate::error::PageError;
use crate::pipeline::rasterize::PageImage;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// A remote vision-language model that reads book pages.
///
/// The production implementation is [`crate::gemini::GeminiModel`]; tests
/// inject scripted fakes through
/// [`crate::config::ConversionConfigBuilder::model_client`].
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Upload the page image and return the model's raw textual reading.
    ///
    /// Implementations map transfer failures to [`PageError::UploadFailed`]
    /// and generation failures (including a reply with no text at all) to
    /// [`PageError::GenerationFailed`]. An upload failure must never be
    /// followed by a generation attempt.
    async fn transcribe(&self, page: &PageImage, prompt: &str) -> Result<ModelReply, PageError>;
}

/// Raw model reply plus its token accounting.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    pub prompt_tokens: u32,
    pub output_tokens: u32,
}

/// One page's reading, in whichever shape the model answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    /// Flat text: one paragraph per line, alignment carried by inline markers.
    Markup(String),
    /// Zoned JSON: the five page zones, each possibly empty.
    Zones(ExtractedRecord),
}

/// The five zones of a scanned book page.
///
/// Absent zones are empty strings, never missing fields, so downstream code
/// can iterate all five unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecord {
    /// Running head repeated at the top of every page.
    pub header: String,
    /// Chapter or section title.
    pub heading: String,
    /// Body text.
    pub main_content: String,
    /// Text below the footnote separator line.
    pub footnotes: String,
    /// Page-number area at the bottom.
    pub footer: String,
}

/// Parsed page content plus the token accounting of the call that produced it.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    pub content: PageContent,
    pub prompt_tokens: u32,
    pub output_tokens: u32,
}

/// Transcribe one page and parse the reply.
pub async fn extract_page(
    model: &dyn VisionModel,
    page: &PageImage,
    prompt: &str,
) -> Result<PageExtraction, PageError> {
    let reply = model.transcribe(page, prompt).await?;
    debug!(
        "Page {}: model returned {} chars",
        page.number,
        reply.text.len()
    );
    let content = parse_response(page.number, &reply.text)?;
    Ok(PageExtraction {
        content,
        prompt_tokens: reply.prompt_tokens,
        output_tokens: reply.output_tokens,
    })
}

// ── Sanitising ───────────────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|arabic)?\n(.*)\n```\s*$").unwrap());

/// Stray wrapper tokens models are known to emit mid-text, most specific
/// first so `arabic` never survives the removal of its fenced form.
const STRAY_TOKENS: [&str; 6] = ["```arabic", "```json", "```", "'''", "arabic", "#"];

/// Remove fences and stray wrapper tokens from a raw model reply.
pub fn sanitize_response(raw: &str) -> String {
    let mut text = match RE_OUTER_FENCES.captures(raw.trim()) {
        Some(caps) => caps[1].to_string(),
        None => raw.to_string(),
    };
    for token in STRAY_TOKENS {
        if text.contains(token) {
            text = text.replace(token, "");
        }
    }
    text
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// Wire shape of the zoned reply. All keys optional, anything else rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ZoneWire {
    header: Option<String>,
    heading: Option<String>,
    main_content: Option<String>,
    footnotes: Option<String>,
    footer: Option<String>,
}

impl From<ZoneWire> for ExtractedRecord {
    fn from(wire: ZoneWire) -> Self {
        ExtractedRecord {
            header: wire.header.unwrap_or_default(),
            heading: wire.heading.unwrap_or_default(),
            main_content: wire.main_content.unwrap_or_default(),
            footnotes: wire.footnotes.unwrap_or_default(),
            footer: wire.footer.unwrap_or_default(),
        }
    }
}

/// Sanitise a raw reply and parse it into [`PageContent`].
///
/// An empty reply is [`PageError::GenerationFailed`]; a reply that opens a
/// JSON object but does not parse as the zone shape is
/// [`PageError::UnparseableResponse`]; anything else is flat markup.
pub fn parse_response(page: usize, raw: &str) -> Result<PageContent, PageError> {
    let cleaned = sanitize_response(raw);
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        return Err(PageError::GenerationFailed {
            page,
            detail: "reply carried no text".into(),
        });
    }

    if trimmed.starts_with('{') {
        let wire: ZoneWire =
            serde_json::from_str(trimmed).map_err(|e| PageError::UnparseableResponse {
                page,
                detail: e.to_string(),
            })?;
        return Ok(PageContent::Zones(wire.into()));
    }

    Ok(PageContent::Markup(cleaned))
}

// ── Tests ────────────────────────────────────────────────────────────────────
