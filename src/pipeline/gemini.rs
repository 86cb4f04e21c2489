//! Gemini `generateContent` client: one image in, one passport record out.
//!
//! This module owns the wire format (request body, response envelope, error
//! envelope) and the mapping of raw failures to the short messages shown to
//! the user. Prompt text lives in [`crate::prompts`]; parsing of the model's
//! answer lives in [`crate::pipeline::parse`].
//!
//! There is no retry: a failed call becomes a failed record and the user
//! decides whether to resubmit.

use crate::config::ExtractionConfig;
use crate::error::{ExtractionError, PassportOcrError};
use crate::pipeline::parse::parse_response;
use crate::pipeline::preprocess::PreparedImage;
use crate::prompts::EXTRACTION_PROMPT;
use crate::record::PassportData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Raw error bodies are cut to this many characters.
const RAW_BODY_LIMIT: usize = 200;

/// Categories relaxed to `BLOCK_NONE`; passport photos of faces and ID
/// numbers otherwise trip the default filters.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

// ── Wire types: request ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

/// Snake-case on the wire, as the REST API documents it.
#[derive(Debug, Serialize)]
pub struct InlineData<'a> {
    pub mime_type: &'a str,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

// ── Wire types: response ─────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────────────

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: ExtractionConfig,
}

impl GeminiClient {
    pub fn new(config: ExtractionConfig) -> Result<Self, PassportOcrError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| PassportOcrError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Build the request body for one image.
    pub fn build_request<'a>(&'a self, image: &'a PreparedImage) -> GenerateRequest<'a> {
        let prompt = self.config.prompt.as_deref().unwrap_or(EXTRACTION_PROMPT);
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type,
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }

    /// Send one image and return the model's raw text answer.
    pub async fn generate(
        &self,
        api_key: &str,
        image: &PreparedImage,
    ) -> Result<String, ExtractionError> {
        let start = Instant::now();
        let body = self.build_request(image);
        info!("Sending {} to {}", image.file_name, self.config.model);

        let response = self
            .http
            .post(self.config.generate_url())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(transport_error)?;

        if !status.is_success() {
            warn!("API error {} for {}", status.as_u16(), image.file_name);
            debug!("Error body: {}", truncate_chars(&text, RAW_BODY_LIMIT));
            return Err(api_error(status.as_u16(), &text));
        }

        let envelope: GenerateResponse =
            serde_json::from_str(&text).map_err(|_| ExtractionError::InvalidResponse)?;
        let content = response_text(&envelope)?;

        debug!(
            "{}: {} chars in {:?}; raw: {}",
            image.file_name,
            content.len(),
            start.elapsed(),
            truncate_chars(&content, 300)
        );
        Ok(content)
    }

    /// [`Self::generate`] followed by parsing, with errors made user-facing.
    pub async fn extract(
        &self,
        api_key: &str,
        image: &PreparedImage,
    ) -> Result<PassportData, ExtractionError> {
        self.generate(api_key, image)
            .await
            .map(|raw| parse_response(&raw))
            .map_err(friendly_error)
    }
}

/// First text part of the first candidate, trimmed.
pub fn response_text(envelope: &GenerateResponse) -> Result<String, ExtractionError> {
    let first = envelope.candidates.first();
    let text = first
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .and_then(|p| p.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(t) = text {
        return Ok(t.to_string());
    }

    let candidate_blocked = first.and_then(|c| c.finish_reason.as_deref()) == Some("SAFETY");
    let prompt_blocked = envelope
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
        == Some("SAFETY");

    if candidate_blocked || prompt_blocked {
        Err(ExtractionError::SafetyBlocked)
    } else {
        Err(ExtractionError::InvalidResponse)
    }
}

/// Map a non-2xx response body to an error.
///
/// JSON bodies yield [`ExtractionError::Api`] with `error.message` (or the
/// top-level `message`, or `HTTP <status>`); anything else yields
/// [`ExtractionError::ApiRaw`] with the body cut to 200 characters.
pub fn api_error(status: u16, body: &str) -> ExtractionError {
    let Ok(v) = serde_json::from_str::<Value>(body) else {
        return ExtractionError::ApiRaw {
            status,
            body: truncate_chars(body, RAW_BODY_LIMIT),
        };
    };

    let message = v
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| v.get("message").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"));

    let mut markers: Vec<&str> = Vec::new();
    if let Some(s) = v.pointer("/error/status").and_then(Value::as_str) {
        markers.push(s);
    }
    if let Some(details) = v.pointer("/error/details").and_then(Value::as_array) {
        markers.extend(
            details
                .iter()
                .filter_map(|d| d.get("reason").and_then(Value::as_str)),
        );
    }

    ExtractionError::Api {
        status,
        message,
        marker: markers.join(" "),
    }
}

/// Rewrite a failure into one of the fixed user-facing messages.
///
/// Looks for known markers in the error text, HTTP status and envelope
/// reasons; first match wins. Unmatched errors are returned unchanged, and
/// so are local file failures, whose text carries the user's file name.
pub fn friendly_error(err: ExtractionError) -> ExtractionError {
    use ExtractionError::*;
    if matches!(
        err,
        InvalidApiKey
            | QuotaExceeded
            | Forbidden
            | ModelNotFound
            | SafetyBlocked
            | ReadFailed { .. }
            | DecodeFailed { .. }
            | EncodeFailed { .. }
    ) {
        return err;
    }

    let mut haystack = err.to_string();
    if let Some(status) = err.status() {
        haystack.push_str(&format!(" {status}"));
    }
    if let Api { ref marker, .. } = err {
        haystack.push(' ');
        haystack.push_str(marker);
    }

    if haystack.contains("401") || haystack.contains("API_KEY_INVALID") {
        InvalidApiKey
    } else if haystack.contains("429")
        || haystack.to_lowercase().contains("quota")
        || haystack.contains("RESOURCE_EXHAUSTED")
    {
        QuotaExceeded
    } else if haystack.contains("403") {
        Forbidden
    } else if haystack.contains("404") {
        ModelNotFound
    } else if haystack.contains("SAFETY") {
        SafetyBlocked
    } else {
        err
    }
}

/// Transport failure with its full cause chain, e.g.
/// `error sending request: client error (Connect): tcp connect error: ...`.
///
/// `without_url` keeps the `?key=` query string out of the message.
fn transport_error(err: reqwest::Error) -> ExtractionError {
    let err = err.without_url();
    let mut message = err.to_string();
    let mut cause = std::error::Error::source(&err);
    while let Some(c) = cause {
        let text = c.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        cause = c.source();
    }
    ExtractionError::Http(message)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
