//! # passport-ocr
//!
//! Extract identity fields from passport photos with Google Gemini and export
//! them to a spreadsheet.
//!
//! ## Why this crate?
//!
//! Reading the data page of a passport by hand is slow and error-prone, and
//! classic OCR struggles with security backgrounds, holograms and skewed
//! phone photos. Instead this crate downsizes each photo, sends it to a
//! vision model with a strict JSON-only prompt, and normalizes whatever comes
//! back into nine fixed fields, recovering from sloppy replies with a regex
//! fallback.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image file
//!  │
//!  ├─ 1. Input       keep image/* files, drop the rest
//!  ├─ 2. Preprocess  decode, downscale to max width, JPEG re-encode (spawn_blocking)
//!  ├─ 3. Gemini      generateContent with prompt + inline image
//!  ├─ 4. Parse       fence strip, brace slice, strict JSON, regex fallback
//!  ├─ 5. Normalize   nine trimmed string fields, passport number uppercased
//!  └─ 6. Output      record table, HTML rows, xlsx workbook
//! ```
//!
//! Files are processed strictly one at a time in submission order; see
//! [`queue`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use passport_ocr::{ExtractionConfig, NoopObserver, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::open("settings.json", ExtractionConfig::default())?;
//!     session.set_api_key("AIza...")?;
//!     session.submit(["passport.jpg"], &NoopObserver).await?;
//!     for row in session.table() {
//!         println!("{} {}", row.file_name, row.badge.label());
//!     }
//!     let path = session.export(".").await?;
//!     eprintln!("wrote {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `passport-ocr` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! passport-ocr = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod queue;
pub mod record;
pub mod render;
pub mod session;
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractionError, PassportOcrError};
pub use export::{build_workbook, export_file_name, export_rows, export_workbook, ExportRow};
pub use extractor::{GeminiExtractor, PassportExtractor};
pub use progress::{BatchSummary, NoopObserver, QueueObserver};
pub use queue::{BatchAcceptance, FileQueue};
pub use record::{FileRecord, FileStatus, PassportData};
pub use render::{escape_html, render_html, render_table, StatusBadge, TableRow};
pub use session::Session;
pub use settings::Settings;
