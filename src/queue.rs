//! The file queue: batch validation, a single worker, and record state.
//!
//! ## Scheduling rule
//!
//! Accepted files wait in `pending`. [`FileQueue::run`] is the only worker:
//! it pops one file, creates its record in `processing`, awaits the complete
//! extraction, moves the record to `success` or `error`, and only then pops
//! the next file. At most one extraction is ever in flight, and a record
//! exists only once its file is being worked on, so every earlier record is
//! already terminal when a new one appears.
//!
//! The queue exclusively owns the record list; everything else reads it
//! through [`FileQueue::records`] or the observer snapshots.

use crate::error::PassportOcrError;
use crate::extractor::PassportExtractor;
use crate::pipeline::input::{partition_batch, AcceptedFile};
use crate::progress::{BatchSummary, QueueObserver};
use crate::record::{FileRecord, FileStatus};
use crate::settings::Settings;
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of validating one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchAcceptance {
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Default)]
pub struct FileQueue {
    records: Vec<FileRecord>,
    pending: VecDeque<AcceptedFile>,
}

impl FileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.pending.is_empty()
    }

    /// Validate a batch and queue its image files.
    ///
    /// # Errors
    /// * [`PassportOcrError::MissingApiKey`] — no credential; nothing queued
    /// * [`PassportOcrError::NoImageFiles`] — every file was rejected; nothing queued
    pub fn accept_batch<I, P>(
        &mut self,
        settings: &Settings,
        paths: I,
    ) -> Result<BatchAcceptance, PassportOcrError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        if !settings.has_api_key() {
            return Err(PassportOcrError::MissingApiKey);
        }

        let batch = partition_batch(paths);
        let rejected = batch.rejected.len();
        if batch.accepted.is_empty() {
            return Err(PassportOcrError::NoImageFiles { rejected });
        }
        if rejected > 0 {
            warn!("{} non-image file(s) skipped", rejected);
        }

        let accepted = batch.accepted.len();
        self.pending.extend(batch.accepted);
        info!("Queued {} file(s)", accepted);
        Ok(BatchAcceptance { accepted, rejected })
    }

    /// Drain the pending files one at a time.
    pub async fn run(
        &mut self,
        extractor: &dyn PassportExtractor,
        api_key: &str,
        observer: &dyn QueueObserver,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();

        while let Some(file) = self.pending.pop_front() {
            let index = self.records.len();
            self.records.push(FileRecord::new(file.file_name.clone()));
            observer.on_file_start(index, &self.records[index], &self.records);

            let outcome = extractor.extract(&file, api_key).await;

            let record = &mut self.records[index];
            match outcome {
                Ok(data) => {
                    info!(
                        "Extracted: {}",
                        if data.passport_no.is_empty() {
                            &file.file_name
                        } else {
                            &data.passport_no
                        }
                    );
                    record.complete(data);
                    summary.succeeded += 1;
                }
                Err(e) => {
                    warn!("Failed: {}: {}", file.file_name, e);
                    record.fail(e.to_string());
                    summary.failed += 1;
                }
            }
            summary.processed += 1;
            observer.on_file_complete(index, &self.records[index], &self.records);
        }

        observer.on_batch_complete(&summary);
        summary
    }

    /// [`Self::accept_batch`] followed by [`Self::run`].
    pub async fn submit<I, P>(
        &mut self,
        settings: &Settings,
        paths: I,
        extractor: &dyn PassportExtractor,
        observer: &dyn QueueObserver,
    ) -> Result<BatchSummary, PassportOcrError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let acceptance = self.accept_batch(settings, paths)?;
        observer.on_batch_accepted(acceptance.accepted, acceptance.rejected);
        Ok(self.run(extractor, &settings.api_key, observer).await)
    }

    /// Drop every record and pending file.
    pub fn reset(&mut self) {
        info!("Clearing {} record(s)", self.records.len());
        self.records.clear();
        self.pending.clear();
    }

    /// Count of records in each state: `(processing, success, error)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.records
            .iter()
            .fold((0, 0, 0), |(p, s, e), r| match r.status {
                FileStatus::Processing => (p + 1, s, e),
                FileStatus::Success => (p, s + 1, e),
                FileStatus::Error => (p, s, e + 1),
            })
    }
}
