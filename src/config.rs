//! Configuration types for passport extraction.
//!
//! Every knob of the extraction pipeline lives in [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The API key is deliberately *not*
//! part of it: the key belongs to [`crate::settings::Settings`] and is
//! passed per call, so a session can change keys without rebuilding the
//! client.

use crate::error::PassportOcrError;
use serde::{Deserialize, Serialize};

/// Default Gemini REST endpoint (without the `/models/...` suffix).
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for a passport extraction run.
///
/// # Example
/// ```rust
/// use passport_ocr::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gemini-2.5-pro")
///     .max_width(1024)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_width, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Base URL of the `generateContent` API. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Images wider than this are downscaled before upload. Default: 1536.
    ///
    /// The MRZ stays legible at this width while a phone photo shrinks to a
    /// few hundred kilobytes.
    pub max_width: u32,

    /// JPEG quality for the re-encoded upload, 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// Sampling temperature. Default: 0.05.
    pub temperature: f32,

    /// Nucleus sampling cutoff. Default: 0.1.
    pub top_p: f32,

    /// Top-k sampling cutoff. Default: 20.
    pub top_k: u32,

    /// Maximum output tokens. Default: 4096.
    pub max_output_tokens: u32,

    /// Per-request timeout in seconds. Default: none (HTTP layer default).
    pub api_timeout_secs: Option<u64>,

    /// Custom extraction prompt. If None, uses [`crate::prompts::EXTRACTION_PROMPT`].
    pub prompt: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_width: 1536,
            jpeg_quality: 90,
            temperature: 0.05,
            top_p: 0.1,
            top_k: 20,
            max_output_tokens: 4096,
            api_timeout_secs: None,
            prompt: None,
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full `generateContent` URL for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_width(mut self, px: u32) -> Self {
        self.config.max_width = px.max(64);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.config.top_k = k.max(1);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, PassportOcrError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(PassportOcrError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(PassportOcrError::InvalidConfig(format!(
                "endpoint must be an HTTP(S) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.max_output_tokens == 0 {
            return Err(PassportOcrError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
