//! Table rendering as a pure projection of the record list.
//!
//! [`render_table`] builds a front-end-neutral row model; [`render_html`]
//! turns it into `<tr>` markup with every user-supplied string escaped.
//! Neither touches queue state, so rendering the same records twice yields
//! identical output.

use crate::record::{FileRecord, FileStatus};
use serde::Serialize;
use std::fmt::Write;

/// Column headers of the results table.
pub const TABLE_HEADERS: [&str; 12] = [
    "#",
    "File",
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusBadge {
    Processing,
    Success,
    Failed,
}

impl StatusBadge {
    pub fn label(self) -> &'static str {
        match self {
            StatusBadge::Processing => "⏳ Processing",
            StatusBadge::Success => "✅ Success",
            StatusBadge::Failed => "❌ Failed",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            StatusBadge::Processing => "badge-processing",
            StatusBadge::Success => "badge-success",
            StatusBadge::Failed => "badge-error",
        }
    }
}

impl From<FileStatus> for StatusBadge {
    fn from(s: FileStatus) -> Self {
        match s {
            FileStatus::Processing => StatusBadge::Processing,
            FileStatus::Success => StatusBadge::Success,
            FileStatus::Error => StatusBadge::Failed,
        }
    }
}

/// One rendered row. Text is raw; escaping is the projection's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// 1-based.
    pub index: usize,
    pub file_name: String,
    /// `Processing...` while processing, the error text on failure.
    pub status_note: Option<String>,
    pub fields: [String; 9],
    pub badge: StatusBadge,
}

pub fn render_table(records: &[FileRecord]) -> Vec<TableRow> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| TableRow {
            index: i + 1,
            file_name: r.file_name.clone(),
            status_note: match r.status {
                FileStatus::Processing => Some("Processing...".to_string()),
                FileStatus::Error => Some(r.error.clone().unwrap_or_default()),
                FileStatus::Success => None,
            },
            fields: r.data.values().map(str::to_string),
            badge: r.status.into(),
        })
        .collect()
}

/// Escape text for insertion into HTML element content or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<tr>` rows for the table body.
pub fn render_html(records: &[FileRecord]) -> String {
    let mut html = String::new();
    for row in render_table(records) {
        let row_class = match row.badge {
            StatusBadge::Failed => " class=\"row-error\"",
            StatusBadge::Processing => " class=\"row-processing\"",
            StatusBadge::Success => "",
        };
        let _ = writeln!(html, "<tr{row_class}>");
        let _ = writeln!(html, "  <td class=\"td-center\">{}</td>", row.index);
        let _ = write!(
            html,
            "  <td class=\"td-file\"><span class=\"file-name\">{}</span>",
            escape_html(&row.file_name)
        );
        if let Some(note) = &row.status_note {
            let kind = if row.badge == StatusBadge::Failed {
                "error"
            } else {
                "processing"
            };
            let _ = write!(
                html,
                "<span class=\"file-status {kind}\">{}</span>",
                escape_html(note)
            );
        }
        html.push_str("</td>\n");
        for (i, field) in row.fields.iter().enumerate() {
            if i == 0 {
                let _ = writeln!(
                    html,
                    "  <td class=\"td-passport\"><span class=\"passport-badge\">{}</span></td>",
                    escape_html(field)
                );
            } else {
                let _ = writeln!(html, "  <td>{}</td>", escape_html(field));
            }
        }
        let _ = writeln!(
            html,
            "  <td class=\"td-status\"><span class=\"badge {}\">{}</span></td>",
            row.badge.css_class(),
            row.badge.label()
        );
        html.push_str("</tr>\n");
    }
    html
}

/// A standalone HTML page wrapping [`render_html`].
pub fn render_html_document(records: &[FileRecord]) -> String {
    let mut head = String::new();
    for h in TABLE_HEADERS {
        let _ = write!(head, "<th>{}</th>", escape_html(h));
    }
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Passport OCR results</title></head>\n\
         <body>\n<p>{} file(s)</p>\n<table>\n<thead><tr>{head}</tr></thead>\n<tbody>\n{}</tbody>\n</table>\n</body>\n</html>\n",
        records.len(),
        render_html(records)
    )
}
