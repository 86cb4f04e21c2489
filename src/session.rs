//! Application state for one run of the tool.
//!
//! A [`Session`] owns the settings, the queue and the extractor. It is
//! created at startup, lives for the process and is the only writer of the
//! record list; front ends drive it and read snapshots back.

use crate::config::ExtractionConfig;
use crate::error::PassportOcrError;
use crate::export::export_workbook;
use crate::extractor::{GeminiExtractor, PassportExtractor};
use crate::progress::{BatchSummary, QueueObserver};
use crate::queue::FileQueue;
use crate::record::FileRecord;
use crate::render::{render_table, TableRow};
use crate::settings::Settings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub struct Session {
    settings: Settings,
    settings_path: PathBuf,
    config: ExtractionConfig,
    queue: FileQueue,
    extractor: Arc<dyn PassportExtractor>,
}

impl Session {
    /// Load settings from `settings_path` and build a Gemini extractor.
    pub fn open(
        settings_path: impl Into<PathBuf>,
        config: ExtractionConfig,
    ) -> Result<Self, PassportOcrError> {
        let settings_path = settings_path.into();
        let settings = Settings::load(&settings_path)?;
        let extractor = Arc::new(GeminiExtractor::new(config.clone())?);
        Ok(Self::with_extractor(settings_path, settings, config, extractor))
    }

    /// Build a session around an existing extractor.
    pub fn with_extractor(
        settings_path: impl Into<PathBuf>,
        settings: Settings,
        config: ExtractionConfig,
        extractor: Arc<dyn PassportExtractor>,
    ) -> Self {
        Self {
            settings,
            settings_path: settings_path.into(),
            config,
            queue: FileQueue::new(),
            extractor,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Store and persist a new API key. Returns `false` if it does not look
    /// like a Google AI key.
    pub fn set_api_key(&mut self, key: &str) -> Result<bool, PassportOcrError> {
        let mut next = self.settings.clone();
        let looks_valid = next.set_api_key(key)?;
        next.save(&self.settings_path)?;
        self.settings = next;
        info!("API key saved");
        Ok(looks_valid)
    }

    /// Use `key` for this process only; nothing is written.
    pub fn override_api_key(&mut self, key: &str) -> Result<(), PassportOcrError> {
        self.settings.set_api_key(key)?;
        Ok(())
    }

    /// Validate and process one batch of paths.
    pub async fn submit<I, P>(
        &mut self,
        paths: I,
        observer: &dyn QueueObserver,
    ) -> Result<BatchSummary, PassportOcrError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.queue
            .submit(&self.settings, paths, self.extractor.as_ref(), observer)
            .await
    }

    pub fn records(&self) -> &[FileRecord] {
        self.queue.records()
    }

    pub fn table(&self) -> Vec<TableRow> {
        render_table(self.queue.records())
    }

    /// `(processing, success, error)`
    pub fn counts(&self) -> (usize, usize, usize) {
        self.queue.counts()
    }

    /// Write the current records to a timestamped workbook in `dir`.
    pub async fn export(&self, dir: impl AsRef<Path>) -> Result<PathBuf, PassportOcrError> {
        export_workbook(self.queue.records(), dir).await
    }

    pub fn reset(&mut self) {
        self.queue.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::pipeline::input::AcceptedFile;
    use crate::progress::NoopObserver;
    use crate::record::{FileStatus, PassportData};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct EchoExtractor;

    #[async_trait]
    impl PassportExtractor for EchoExtractor {
        async fn extract(
            &self,
            file: &AcceptedFile,
            _api_key: &str,
        ) -> Result<PassportData, ExtractionError> {
            Ok(PassportData {
                full_name: file.file_name.clone(),
                ..Default::default()
            })
        }
    }

    fn session(dir: &TempDir, key: &str) -> Session {
        Session::with_extractor(
            dir.path().join("settings.json"),
            Settings {
                api_key: key.into(),
            },
            ExtractionConfig::default(),
            Arc::new(EchoExtractor),
        )
    }

    #[tokio::test]
    async fn submit_table_export_reset() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, "AIzaTest");

        let summary = s
            .submit(["one.jpg", "skip.txt", "two.png"], &NoopObserver)
            .await
            .unwrap();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(s.table().len(), 2);
        assert_eq!(s.table()[1].fields[1], "two.png");

        let path = s.export(dir.path()).await.unwrap();
        assert!(path.exists());
        assert_eq!(s.records().len(), 2);

        s.reset();
        assert!(s.records().is_empty());
        assert!(matches!(
            s.export(dir.path()).await,
            Err(PassportOcrError::NothingToExport)
        ));
    }

    #[tokio::test]
    async fn submit_without_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, "");
        let err = s.submit(["a.jpg"], &NoopObserver).await.unwrap_err();
        assert!(matches!(err, PassportOcrError::MissingApiKey));
        assert!(s.records().is_empty());
    }

    #[test]
    fn set_api_key_persists() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, "");
        assert!(s.set_api_key("  AIzaNewKey ").unwrap());
        assert_eq!(s.settings().api_key, "AIzaNewKey");

        let reloaded = Settings::load(s.settings_path()).unwrap();
        assert_eq!(reloaded.api_key, "AIzaNewKey");
    }

    #[test]
    fn empty_key_leaves_settings_untouched() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, "AIzaOld");
        assert!(s.set_api_key("   ").is_err());
        assert_eq!(s.settings().api_key, "AIzaOld");
        assert!(!s.settings_path().exists());
    }

    #[tokio::test]
    async fn override_key_is_not_persisted() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, "");
        s.override_api_key("AIzaEnv").unwrap();
        s.submit(["a.jpg"], &NoopObserver).await.unwrap();
        assert_eq!(s.records()[0].status, FileStatus::Success);
        assert!(!s.settings_path().exists());
    }
}
