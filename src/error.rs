//! Error types for the passport-ocr library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PassportOcrError`] — **Fatal**: the operation cannot proceed at all
//!   (no API key configured, no image in the batch, nothing to export).
//!   Returned as `Err(PassportOcrError)` and leaves the record list untouched.
//!
//! * [`ExtractionError`] — **Non-fatal**: a single file failed (bad image,
//!   API error, safety block) but the rest of the batch carries on. Its
//!   display string is stored on the file's [`crate::record::FileRecord`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the passport-ocr library.
#[derive(Debug, Error)]
pub enum PassportOcrError {
    // ── Batch validation ──────────────────────────────────────────────────
    /// No API key is stored; the batch is rejected before any record exists.
    #[error("No API key configured.\nRun: passport-ocr config --api-key <KEY>")]
    MissingApiKey,

    /// Every file in the batch was rejected by the image filter.
    #[error("Please upload image files (JPG, PNG, WebP): {rejected} file(s) rejected")]
    NoImageFiles { rejected: usize },

    // ── Export ────────────────────────────────────────────────────────────
    /// Export was requested with an empty record list.
    #[error("No data to export")]
    NothingToExport,

    /// The spreadsheet could not be assembled.
    #[error("Export failed: {detail}")]
    ExportFailed { detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Settings ──────────────────────────────────────────────────────────
    /// The settings file exists but could not be read.
    #[error("Failed to read settings '{path}': {source}")]
    SettingsReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file could not be written.
    #[error("Failed to save settings '{path}': {detail}")]
    SettingsWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file.
///
/// The last five variants are the user-facing messages produced by
/// [`crate::pipeline::gemini::friendly_error`]; the rest are raw failures
/// that did not match any known pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ExtractionError {
    /// The file could not be read from disk.
    #[error("Failed to read '{file}': {detail}")]
    ReadFailed { file: String, detail: String },

    /// The bytes are not a decodable image.
    #[error("Failed to decode image: {detail}")]
    DecodeFailed { detail: String },

    /// Re-encoding the resized image failed.
    #[error("Failed to encode image: {detail}")]
    EncodeFailed { detail: String },

    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("Request failed: {0}")]
    Http(String),

    /// Non-2xx response whose body was a JSON error envelope.
    ///
    /// `marker` carries the envelope's machine-readable status and reasons
    /// (e.g. `INVALID_ARGUMENT API_KEY_INVALID`) for error remapping.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        marker: String,
    },

    /// Non-2xx response whose body was not JSON (truncated to 200 chars).
    #[error("API Error {status}: {body}")]
    ApiRaw { status: u16, body: String },

    /// 2xx response without any usable text.
    #[error("Invalid response from Gemini AI")]
    InvalidResponse,

    // ── Friendly, remapped ────────────────────────────────────────────────
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Quota exceeded. Please wait or try tomorrow.")]
    QuotaExceeded,

    #[error("API access forbidden")]
    Forbidden,

    #[error("Model not found")]
    ModelNotFound,

    #[error("Image blocked by safety filters")]
    SafetyBlocked,
}

impl ExtractionError {
    /// HTTP status attached to this error, if it came from an API response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ExtractionError::Api { status, .. } | ExtractionError::ApiRaw { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_image_files_display() {
        let e = PassportOcrError::NoImageFiles { rejected: 3 };
        assert!(e.to_string().contains("3 file(s)"), "got: {e}");
    }

    #[test]
    fn api_raw_display_carries_status() {
        let e = ExtractionError::ApiRaw {
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert_eq!(e.to_string(), "API Error 502: Bad Gateway");
        assert_eq!(e.status(), Some(502));
    }

    #[test]
    fn api_display_is_message_only() {
        let e = ExtractionError::Api {
            status: 400,
            message: "API key not valid.".into(),
            marker: "API_KEY_INVALID".into(),
        };
        assert_eq!(e.to_string(), "API key not valid.");
    }

    #[test]
    fn missing_api_key_points_to_config() {
        assert!(PassportOcrError::MissingApiKey
            .to_string()
            .contains("passport-ocr config"));
    }
}
