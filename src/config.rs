//! Configuration types for PDF-to-Word conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, log them, and diff two runs to
//! understand why their outputs differ.

use crate::error::NaskhError;
use crate::pacing::Pacer;
use crate::pipeline::extract::VisionModel;
use crate::progress::ConversionProgress;
use std::fmt;
use std::sync::Arc;

/// Configuration for a PDF-to-Word conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use naskh::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .page_range(1, 25)
///     .api_key("AIza...")
///     .include_footnotes(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// First page to convert, 1-indexed inclusive. Default: 1.
    pub start_page: usize,

    /// Last page to convert, 1-indexed inclusive. Default: 0.
    ///
    /// 0 means "through the last page". Values past the end of the document
    /// are normalised down to the last page; the range is only invalid when
    /// `start_page` ends up past the normalised end.
    pub end_page: usize,

    /// Caller-supplied Gemini API key. Default: None.
    ///
    /// Presence of this key is what distinguishes a paid run from a free-tier
    /// run: without it the conversion authenticates with the `GEMINI_API_KEY`
    /// (or `API_KEY`) environment variable but is capped at 10 pages and paced
    /// at the free-tier interval. With it, the cap is lifted and pacing drops
    /// to the paid interval.
    pub api_key: Option<String>,

    /// Emit the running-head and page-number zones. Default: false.
    pub include_header_footer: bool,

    /// Emit the footnote zone (text below the separator line). Default: false.
    pub include_footnotes: bool,

    /// Literal strings removed from every output line. Default: empty.
    ///
    /// Removal repeats until no occurrence remains, so strings whose removal
    /// exposes new occurrences are still fully eliminated.
    pub strip_strings: Vec<String>,

    /// Gemini model identifier. Default: "gemini-1.5-pro-latest".
    pub model: String,

    /// Maximum rendered page dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap on rasterisation. Scanned folio pages at print resolution
    /// can run past 10 000 px a side and exhaust memory; this field caps either
    /// dimension, scaling the other proportionally, so pdfium never allocates
    /// more than roughly `max_rendered_pixels²` bytes of pixels. The cap also
    /// keeps JPEG uploads well below the Files API size limit.
    pub max_rendered_pixels: u32,

    /// Per-remote-call timeout in seconds (upload and generation each). Default: 120.
    pub api_timeout_secs: u64,

    /// Custom extraction prompt. If None, uses the built-in zoned prompt.
    pub prompt_override: Option<String>,

    /// Pre-constructed model client. Takes precedence over `api_key`.
    pub model_client: Option<Arc<dyn VisionModel>>,

    /// Pacing policy between remote calls. If None, chosen from credential presence.
    pub pacer: Option<Arc<dyn Pacer>>,

    /// Progress callback. If None, progress is not reported.
    pub progress: Option<Arc<dyn ConversionProgress>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            start_page: 1,
            end_page: 0,
            api_key: None,
            include_header_footer: false,
            include_footnotes: false,
            strip_strings: Vec::new(),
            model: "gemini-1.5-pro-latest".to_string(),
            max_rendered_pixels: 2000,
            api_timeout_secs: 120,
            prompt_override: None,
            model_client: None,
            pacer: None,
            progress: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("start_page", &self.start_page)
            .field("end_page", &self.end_page)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("include_header_footer", &self.include_header_footer)
            .field("include_footnotes", &self.include_footnotes)
            .field("strip_strings", &self.strip_strings)
            .field("model", &self.model)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("prompt_override", &self.prompt_override.as_ref().map(|_| "<custom>"))
            .field("model_client", &self.model_client.as_ref().map(|_| "<dyn VisionModel>"))
            .field("pacer", &self.pacer.as_ref().map(|_| "<dyn Pacer>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn start_page(mut self, page: usize) -> Self {
        self.config.start_page = page.max(1);
        self
    }

    pub fn end_page(mut self, page: usize) -> Self {
        self.config.end_page = page;
        self
    }

    /// Set both ends of the page range at once (1-indexed, inclusive; end 0 = last page).
    pub fn page_range(mut self, start: usize, end: usize) -> Self {
        self.config.start_page = start.max(1);
        self.config.end_page = end;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn include_header_footer(mut self, v: bool) -> Self {
        self.config.include_header_footer = v;
        self
    }

    pub fn include_footnotes(mut self, v: bool) -> Self {
        self.config.include_footnotes = v;
        self
    }

    /// Replace the strip list. Empty entries are dropped.
    pub fn strip_strings(mut self, strings: Vec<String>) -> Self {
        self.config.strip_strings = strings.into_iter().filter(|s| !s.is_empty()).collect();
        self
    }

    /// Append one string to the strip list. Empty strings are dropped.
    pub fn strip_string(mut self, s: impl Into<String>) -> Self {
        let s = s.into();
        if !s.is_empty() {
            self.config.strip_strings.push(s);
        }
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn prompt_override(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt_override = Some(prompt.into());
        self
    }

    pub fn model_client(mut self, client: Arc<dyn VisionModel>) -> Self {
        self.config.model_client = Some(client);
        self
    }

    pub fn pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.config.pacer = Some(pacer);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ConversionProgress>) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, NaskhError> {
        let c = &self.config;
        if c.model.is_empty() {
            return Err(NaskhError::InvalidConfig(
                "Model identifier must not be empty".into(),
            ));
        }
        if let Some(key) = &c.api_key {
            if key.trim().is_empty() {
                return Err(NaskhError::InvalidConfig(
                    "API key must not be blank; omit it to use the environment key".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
