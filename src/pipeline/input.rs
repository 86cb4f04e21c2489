//! Batch acceptance: split user-supplied paths into images and the rest.
//!
//! The filter looks at the MIME type guessed from the file extension, which
//! is what a browser file picker reports as `File.type`. Content is not
//! sniffed here; a mislabelled file gets through and fails later in
//! [`crate::pipeline::preprocess`] as a per-file decode error.

use crate::error::ExtractionError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file that passed the image filter and waits in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    pub path: PathBuf,
    /// Display name (last path component).
    pub file_name: String,
}

impl AcceptedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = display_name(&path);
        Self { path, file_name }
    }

    /// Read the raw bytes of the file.
    pub async fn read(&self) -> Result<Vec<u8>, ExtractionError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| ExtractionError::ReadFailed {
                file: self.file_name.clone(),
                detail: e.to_string(),
            })
    }
}

/// Result of filtering one batch.
#[derive(Debug, Default)]
pub struct BatchPartition {
    pub accepted: Vec<AcceptedFile>,
    pub rejected: Vec<PathBuf>,
}

/// Check whether the path's extension maps to an `image/*` MIME type.
pub fn is_image_path(path: &Path) -> bool {
    mime_guess::from_path(path)
        .iter()
        .any(|m| m.type_() == mime_guess::mime::IMAGE)
}

/// Split a batch into accepted images and rejected paths, preserving order.
pub fn partition_batch<I, P>(paths: I) -> BatchPartition
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut out = BatchPartition::default();
    for p in paths {
        let path = p.into();
        if is_image_path(&path) {
            out.accepted.push(AcceptedFile::new(path));
        } else {
            debug!("Rejected non-image file: {}", path.display());
            out.rejected.push(path);
        }
    }
    out
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("scan.jpg")));
        assert!(is_image_path(Path::new("scan.JPEG")));
        assert!(is_image_path(Path::new("/tmp/a/b.png")));
        assert!(is_image_path(Path::new("photo.webp")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("passport.pdf")));
        assert!(!is_image_path(Path::new("no_extension")));
    }

    #[test]
    fn partition_keeps_order_and_counts() {
        let part = partition_batch(["b.png", "readme.md", "a.jpg"]);
        let names: Vec<_> = part.accepted.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.png", "a.jpg"]);
        assert_eq!(part.rejected, vec![PathBuf::from("readme.md")]);
    }

    #[test]
    fn display_name_is_last_component() {
        let f = AcceptedFile::new("/data/batch-1/P001.jpg");
        assert_eq!(f.file_name, "P001.jpg");
    }

    #[tokio::test]
    async fn read_missing_file_is_per_file_error() {
        let f = AcceptedFile::new("/definitely/not/here.jpg");
        let err = f.read().await.unwrap_err();
        assert!(matches!(err, ExtractionError::ReadFailed { .. }));
    }
}
