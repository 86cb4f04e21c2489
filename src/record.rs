//! Per-file tracking records.
//!
//! A [`FileRecord`] is created the moment the queue picks a file up, already
//! in [`FileStatus::Processing`], and moves forward exactly once to
//! `Success` or `Error`. [`PassportData`] is a fixed nine-field struct, so a
//! record can never hold a partial field set.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The nine fields extracted from a passport data page.
///
/// Every field is a plain `String`; a missing value is `""`, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PassportData {
    pub passport_no: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub date_of_issue: String,
    pub date_of_expiry: String,
    pub nationality: String,
    pub gender: String,
    pub issuing_authority: String,
}

impl PassportData {
    /// Wire names of the nine fields, in display order.
    pub const KEYS: [&'static str; 9] = [
        "passportNo",
        "fullName",
        "dateOfBirth",
        "placeOfBirth",
        "dateOfIssue",
        "dateOfExpiry",
        "nationality",
        "gender",
        "issuingAuthority",
    ];

    /// Field values in the same order as [`Self::KEYS`].
    pub fn values(&self) -> [&str; 9] {
        [
            &self.passport_no,
            &self.full_name,
            &self.date_of_birth,
            &self.place_of_birth,
            &self.date_of_issue,
            &self.date_of_expiry,
            &self.nationality,
            &self.gender,
            &self.issuing_authority,
        ]
    }

    /// Mutable slot for a wire key, `None` for unknown keys.
    pub fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "passportNo" => Some(&mut self.passport_no),
            "fullName" => Some(&mut self.full_name),
            "dateOfBirth" => Some(&mut self.date_of_birth),
            "placeOfBirth" => Some(&mut self.place_of_birth),
            "dateOfIssue" => Some(&mut self.date_of_issue),
            "dateOfExpiry" => Some(&mut self.date_of_expiry),
            "nationality" => Some(&mut self.nationality),
            "gender" => Some(&mut self.gender),
            "issuingAuthority" => Some(&mut self.issuing_authority),
            _ => None,
        }
    }
}

/// Lifecycle state of a [`FileRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Processing,
    Success,
    Error,
}

impl FileStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, FileStatus::Processing)
    }
}

/// One uploaded image and what became of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub file_name: String,
    pub status: FileStatus,
    pub data: PassportData,
    pub error: Option<String>,
}

impl FileRecord {
    /// A fresh record in `Processing` with empty data.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            status: FileStatus::Processing,
            data: PassportData::default(),
            error: None,
        }
    }

    /// `Processing → Success`. Returns `false` if the record was already terminal.
    pub fn complete(&mut self, data: PassportData) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.data = data;
        self.status = FileStatus::Success;
        true
    }

    /// `Processing → Error`. Returns `false` if the record was already terminal.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.error = Some(message.into());
        self.status = FileStatus::Error;
        true
    }
}
