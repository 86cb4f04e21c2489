//! Observer trait for queue events.
//!
//! The queue calls a [`QueueObserver`] every time the record list changes,
//! which is where a front end redraws its table. Every callback receives a
//! read-only snapshot of all records so an observer never needs its own
//! copy of queue state.
//!
//! # Example
//!
//! ```rust
//! use passport_ocr::{FileRecord, QueueObserver};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Redraws(AtomicUsize);
//!
//! impl QueueObserver for Redraws {
//!     fn on_file_complete(&self, _index: usize, _record: &FileRecord, _all: &[FileRecord]) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use crate::record::FileRecord;

/// Summary of one drained batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Called by [`crate::queue::FileQueue`] as it works through files.
///
/// All methods have default no-op implementations. Calls arrive in order on
/// the task that drives the queue; there is never more than one file between
/// `on_file_start` and `on_file_complete`.
pub trait QueueObserver: Send + Sync {
    /// A batch passed validation.
    ///
    /// # Arguments
    /// * `accepted` — files queued
    /// * `rejected` — non-image files dropped from the batch
    fn on_batch_accepted(&self, accepted: usize, rejected: usize) {
        let _ = (accepted, rejected);
    }

    /// A record was created in `processing` and its extraction is starting.
    ///
    /// # Arguments
    /// * `index`   — 0-based position of the record in `all`
    /// * `record`  — the new record
    /// * `all`     — every record, including this one
    fn on_file_start(&self, index: usize, record: &FileRecord, all: &[FileRecord]) {
        let _ = (index, record, all);
    }

    /// The record reached `success` or `error`.
    fn on_file_complete(&self, index: usize, record: &FileRecord, all: &[FileRecord]) {
        let _ = (index, record, all);
    }

    /// The queue is empty again.
    fn on_batch_complete(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// Observer for callers that do not need events.
pub struct NoopObserver;

impl QueueObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        let rec = FileRecord::new("a.jpg");
        obs.on_batch_accepted(1, 0);
        obs.on_file_start(0, &rec, std::slice::from_ref(&rec));
        obs.on_file_complete(0, &rec, std::slice::from_ref(&rec));
        obs.on_batch_complete(&BatchSummary::default());
    }
}
