//! The extraction pipeline for one file, behind a trait.
//!
//! [`PassportExtractor`] is the seam between the queue and the outside world:
//! the queue only knows "give me a record for this file", so tests can swap
//! in a scripted extractor and exercise scheduling without a network.

use crate::config::ExtractionConfig;
use crate::error::{ExtractionError, PassportOcrError};
use crate::pipeline::gemini::GeminiClient;
use crate::pipeline::input::AcceptedFile;
use crate::pipeline::preprocess::preprocess_async;
use crate::record::PassportData;
use async_trait::async_trait;
use tracing::debug;

/// Produces a normalized passport record from one accepted file.
#[async_trait]
pub trait PassportExtractor: Send + Sync {
    async fn extract(
        &self,
        file: &AcceptedFile,
        api_key: &str,
    ) -> Result<PassportData, ExtractionError>;
}

/// read → preprocess → Gemini → parse → normalize.
///
/// Only failures of the API call are remapped to user-facing messages;
/// local read and decode errors are reported as they are.
#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    client: GeminiClient,
}

impl GeminiExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self, PassportOcrError> {
        Ok(Self {
            client: GeminiClient::new(config)?,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        self.client.config()
    }

    async fn run(
        &self,
        file: &AcceptedFile,
        api_key: &str,
    ) -> Result<PassportData, ExtractionError> {
        let bytes = file.read().await?;
        debug!(
            "{}: original size {:.2} KB",
            file.file_name,
            bytes.len() as f64 / 1024.0
        );
        let cfg = self.client.config();
        let image =
            preprocess_async(bytes, file.file_name.clone(), cfg.max_width, cfg.jpeg_quality)
                .await?;
        self.client.extract(api_key, &image).await
    }
}

#[async_trait]
impl PassportExtractor for GeminiExtractor {
    async fn extract(
        &self,
        file: &AcceptedFile,
        api_key: &str,
    ) -> Result<PassportData, ExtractionError> {
        self.run(file, api_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn undecodable_file_fails_before_any_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        // Unroutable endpoint: reaching the network would surface as Http.
        let cfg = ExtractionConfig::builder()
            .endpoint("http://127.0.0.1:9")
            .build()
            .unwrap();
        let extractor = GeminiExtractor::new(cfg).unwrap();
        let file = AcceptedFile::new(&path);

        let err = extractor.extract(&file, "AIzaTest").await.unwrap_err();
        assert!(matches!(err, ExtractionError::DecodeFailed { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn missing_file_named_like_a_status_code_stays_read_failed() {
        let cfg = ExtractionConfig::builder()
            .endpoint("http://127.0.0.1:9")
            .build()
            .unwrap();
        let extractor = GeminiExtractor::new(cfg).unwrap();

        for name in ["P4012345.jpg", "P4291234.jpg", "scan_404.png", "SAFETY.jpg"] {
            let file = AcceptedFile::new(format!("/nonexistent/dir/{name}"));
            let err = extractor.extract(&file, "AIzaTest").await.unwrap_err();
            assert!(
                matches!(err, ExtractionError::ReadFailed { ref file, .. } if file == name),
                "{name}: got {err:?}"
            );
        }
    }
}
