//! Spreadsheet export of the record list.
//!
//! One worksheet, one header row, one row per record in record order. The
//! record list is only read.

use crate::error::PassportOcrError;
use crate::record::{FileRecord, FileStatus};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SHEET_NAME: &str = "Passport Data";

pub const HEADERS: [&str; 12] = [
    "No",
    "File Name",
    "Passport No",
    "Full Name",
    "Date of Birth",
    "Place of Birth",
    "Date of Issue",
    "Date of Expiry",
    "Nationality",
    "Gender",
    "Issuing Authority",
    "Status",
];

/// Character widths, same order as [`HEADERS`].
pub const COLUMN_WIDTHS: [f64; 12] = [
    5.0, 25.0, 15.0, 25.0, 15.0, 20.0, 15.0, 15.0, 12.0, 10.0, 30.0, 15.0,
];

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    /// 1-based.
    pub no: usize,
    pub file_name: String,
    pub fields: [String; 9],
    pub status: String,
}

pub fn status_text(record: &FileRecord) -> String {
    match record.status {
        FileStatus::Success => "Success".to_string(),
        FileStatus::Processing => "Processing".to_string(),
        FileStatus::Error => format!("ERROR: {}", record.error.as_deref().unwrap_or_default()),
    }
}

pub fn export_rows(records: &[FileRecord]) -> Vec<ExportRow> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| ExportRow {
            no: i + 1,
            file_name: r.file_name.clone(),
            fields: r.data.values().map(str::to_string),
            status: status_text(r),
        })
        .collect()
}

/// `LDB_Passport_OCR_<YYYY-MM-DD_HH-MM-SS>.xlsx`
pub fn export_file_name(ts: DateTime<Utc>) -> String {
    format!("LDB_Passport_OCR_{}.xlsx", ts.format("%Y-%m-%d_%H-%M-%S"))
}

/// Build the workbook in memory.
///
/// # Errors
/// [`PassportOcrError::NothingToExport`] for an empty list,
/// [`PassportOcrError::ExportFailed`] if the workbook cannot be assembled.
pub fn build_workbook(records: &[FileRecord]) -> Result<Vec<u8>, PassportOcrError> {
    if records.is_empty() {
        return Err(PassportOcrError::NothingToExport);
    }
    let failed = |e: rust_xlsxwriter::XlsxError| PassportOcrError::ExportFailed {
        detail: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(failed)?;

    for (col, (title, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet
            .write_string_with_format(0, col, *title, &header)
            .map_err(failed)?;
        sheet.set_column_width(col, width).map_err(failed)?;
    }

    for row in export_rows(records) {
        let r = row.no as u32;
        sheet.write_number(r, 0, row.no as f64).map_err(failed)?;
        sheet.write_string(r, 1, &row.file_name).map_err(failed)?;
        for (i, value) in row.fields.iter().enumerate() {
            sheet.write_string(r, 2 + i as u16, value).map_err(failed)?;
        }
        sheet.write_string(r, 11, &row.status).map_err(failed)?;
    }

    workbook.save_to_buffer().map_err(failed)
}

/// Write a timestamped workbook into `dir` and return its path.
///
/// Uses atomic write (temp file + rename) so a failed export never leaves a
/// partial spreadsheet behind.
pub async fn export_workbook(
    records: &[FileRecord],
    dir: impl AsRef<Path>,
) -> Result<PathBuf, PassportOcrError> {
    let bytes = build_workbook(records)?;
    let dir = dir.as_ref();
    let path = dir.join(export_file_name(Utc::now()));

    let write_failed = |e: std::io::Error| PassportOcrError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;
    let tmp_path = path.with_extension("xlsx.tmp");
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(write_failed)?;

    info!(
        "Excel exported: {} ({} records)",
        path.display(),
        records.len()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PassportData;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn records() -> Vec<FileRecord> {
        let mut a = FileRecord::new("a.jpg");
        a.complete(PassportData {
            passport_no: "X1".into(),
            gender: "F".into(),
            ..Default::default()
        });
        let mut b = FileRecord::new("b.jpg");
        b.fail("Invalid response from Gemini AI");
        let c = FileRecord::new("c.jpg");
        vec![a, b, c]
    }

    #[test]
    fn rows_follow_record_order_with_status_text() {
        let rows = export_rows(&records());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].no, 1);
        assert_eq!(rows[0].fields[0], "X1");
        assert_eq!(rows[0].fields[7], "F");
        assert_eq!(rows[0].status, "Success");
        assert_eq!(rows[1].status, "ERROR: Invalid response from Gemini AI");
        assert_eq!(rows[2].status, "Processing");
        assert_eq!(rows[2].no, 3);
    }

    #[test]
    fn file_name_uses_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            export_file_name(ts),
            "LDB_Passport_OCR_2024-03-09_07-05-01.xlsx"
        );
    }

    #[test]
    fn headers_and_widths_line_up() {
        assert_eq!(HEADERS.len(), COLUMN_WIDTHS.len());
        assert_eq!(HEADERS[0], "No");
        assert_eq!(HEADERS[11], "Status");
    }

    #[test]
    fn empty_list_is_nothing_to_export() {
        assert!(matches!(
            build_workbook(&[]),
            Err(PassportOcrError::NothingToExport)
        ));
    }

    fn cell_text(cell: &calamine::Data) -> String {
        match cell {
            calamine::Data::String(s) => s.clone(),
            calamine::Data::Float(f) => f.to_string(),
            calamine::Data::Int(i) => i.to_string(),
            _ => String::new(),
        }
    }

    #[test]
    fn workbook_has_header_and_one_row_per_record() {
        use calamine::Reader;

        let bytes = build_workbook(&records()).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let mut workbook = calamine::open_workbook_auto_from_rs(std::io::Cursor::new(bytes))
            .expect("xlsx should open");
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        assert_eq!(rows.len(), 1 + 3);
        assert_eq!(rows[0], HEADERS.map(str::to_string).to_vec());

        assert_eq!(rows[1][0], "1");
        assert_eq!(rows[1][1], "a.jpg");
        assert_eq!(rows[1][2], "X1");
        assert_eq!(rows[1][9], "F");
        assert_eq!(rows[1][11], "Success");

        assert_eq!(rows[2][1], "b.jpg");
        assert_eq!(rows[2][11], "ERROR: Invalid response from Gemini AI");

        assert_eq!(rows[3][0], "3");
        assert_eq!(rows[3][11], "Processing");
    }

    #[tokio::test]
    async fn export_writes_into_dir_without_touching_records() {
        let dir = TempDir::new().unwrap();
        let recs = records();
        let before = recs.clone();

        let path = export_workbook(&recs, dir.path().join("out")).await.unwrap();

        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("LDB_Passport_OCR_") && name.ends_with(".xlsx"));
        assert!(!path.with_extension("xlsx.tmp").exists());
        assert_eq!(recs, before);
    }
}
