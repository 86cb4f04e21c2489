//! Prompt sent alongside every passport image.
//!
//! Kept in one place so tests can inspect it without a live model.
//! Callers can override it via [`crate::config::ExtractionConfig::prompt`].

/// Default extraction prompt.
///
/// Asks for bare JSON in the nine-field shape, points the model at the MRZ
/// and fixes `""` as the value for anything unreadable. Dates are requested
/// as `DD MMM YYYY`, the same shape the fallback extractor looks for.
pub const EXTRACTION_PROMPT: &str = r#"Extract passport data. Respond with ONLY valid JSON, NO markdown:

{"passportNo":"","fullName":"","dateOfBirth":"DD MMM YYYY","placeOfBirth":"","dateOfIssue":"DD MMM YYYY","dateOfExpiry":"DD MMM YYYY","nationality":"","gender":"","issuingAuthority":""}

Read MRZ (bottom). Use "" for missing."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PassportData;

    #[test]
    fn prompt_names_every_field() {
        for key in PassportData::KEYS {
            assert!(
                EXTRACTION_PROMPT.contains(&format!("\"{key}\"")),
                "prompt is missing {key}"
            );
        }
    }

    #[test]
    fn prompt_mentions_mrz_and_empty_default() {
        assert!(EXTRACTION_PROMPT.contains("MRZ"));
        assert!(EXTRACTION_PROMPT.contains(r#"Use "" for missing"#));
    }
}
