//! Gemini-backed [`VisionModel`]: Files API upload + generateContent.
//!
//! Each page is a strict two-step exchange:
//!
//! 1. **Upload** the rendered JPEG to the Files API. The service replies
//!    with a short-lived file URI. Any failure here is
//!    [`PageError::UploadFailed`] and the page is abandoned — generation is
//!    never attempted against a file that did not land.
//! 2. **Generate** against `models/{model}:generateContent`, passing the
//!    uploaded file reference and the instruction prompt as the two parts of
//!    a single user turn. Transport errors, non-success statuses, and a
//!    reply without candidate text are [`PageError::GenerationFailed`].
//!
//! Both failures are per-page: the orchestrator records them and moves on.

use crate::error::{NaskhError, PageError};
use crate::pipeline::extract::{ModelReply, VisionModel};
use crate::pipeline::rasterize::PageImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Rendered pages are always JPEG (see the rasteriser).
const PAGE_MIME: &str = "image/jpeg";

/// Gemini REST client for page transcription.
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_secs: u64,
}

impl GeminiModel {
    /// Build a client for `model`, authenticating with `api_key`.
    ///
    /// `timeout` bounds each remote call (upload and generation separately).
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NaskhError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NaskhError::Internal(format!("HTTP client construction failed: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Point the client at a different API endpoint (proxy, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Upload one page image to the Files API and return its file reference.
    async fn upload_page(&self, page: &PageImage) -> Result<UploadedFile, PageError> {
        let bytes =
            tokio::fs::read(&page.path)
                .await
                .map_err(|e| PageError::UploadFailed {
                    page: page.number,
                    detail: format!("reading {}: {}", page.path.display(), e),
                })?;

        let url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);
        let response = self
            .client
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header(reqwest::header::CONTENT_TYPE, PAGE_MIME)
            .body(bytes)
            .send()
            .await
            .map_err(|e| PageError::UploadFailed {
                page: page.number,
                detail: self.transport_detail(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PageError::UploadFailed {
                page: page.number,
                detail: format!("HTTP {}: {}", status, snippet(&body)),
            });
        }

        let wire: UploadResponse =
            response
                .json()
                .await
                .map_err(|e| PageError::UploadFailed {
                    page: page.number,
                    detail: format!("decoding upload response: {}", e),
                })?;

        debug!("Page {}: uploaded as {}", page.number, wire.file.uri);
        Ok(wire.file)
    }

    /// Ask the model to read the uploaded page.
    async fn generate(
        &self,
        page_num: usize,
        file: &UploadedFile,
        prompt: &str,
    ) -> Result<ModelReply, PageError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            mime_type: file.mime_type.as_deref().unwrap_or(PAGE_MIME),
                            file_uri: &file.uri,
                        },
                    },
                    Part::Text { text: prompt },
                ],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PageError::GenerationFailed {
                page: page_num,
                detail: self.transport_detail(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PageError::GenerationFailed {
                page: page_num,
                detail: format!("HTTP {}: {}", status, snippet(&body)),
            });
        }

        let wire: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| PageError::GenerationFailed {
                    page: page_num,
                    detail: format!("decoding generation response: {}", e),
                })?;

        let text = wire.candidate_text();
        if text.is_empty() {
            return Err(PageError::GenerationFailed {
                page: page_num,
                detail: "reply carried no candidate text".into(),
            });
        }

        let usage = wire.usage_metadata.unwrap_or_default();
        Ok(ModelReply {
            text,
            prompt_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        })
    }

    fn transport_detail(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("timed out after {}s", self.timeout_secs)
        } else {
            e.to_string()
        }
    }
}

#[async_trait]
impl VisionModel for GeminiModel {
    async fn transcribe(&self, page: &PageImage, prompt: &str) -> Result<ModelReply, PageError> {
        let file = self.upload_page(page).await?;
        self.generate(page.number, &file, prompt).await
    }
}

/// First ~200 chars of an error body, newlines flattened.
fn snippet(body: &str) -> String {
    let flat = body.replace('\n', " ");
    let mut cut = flat.trim().to_string();
    if cut.len() > 200 {
        let boundary = (0..=200).rev().find(|&i| cut.is_char_boundary(i)).unwrap_or(0);
        cut.truncate(boundary);
        cut.push('…');
    }
    cut
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    File { file_data: FileData<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn candidate_text(&self) -> String {
        let mut out = String::new();
        if let Some(content) = self.candidates.first().and_then(|c| c.content.as_ref()) {
            for part in &content.parts {
                if let Some(text) = &part.text {
                    out.push_str(text);
                }
            }
        }
        out
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

// ── Tests ────────────────────────────────────────────────────────────────────
