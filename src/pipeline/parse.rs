//! Response parsing: turn the model's raw text into a [`PassportData`].
//!
//! Even with a "JSON only" prompt, models wrap their answer in ```` ```json ````
//! fences, prefix it with prose, or get cut off mid-object. Parsing runs in
//! four steps and never fails:
//!
//! 1. Take the content of the first fenced block, if any
//! 2. Narrow to the greedy `{ … }` span
//! 3. Strict JSON parse
//! 4. On parse failure, per-field regex recovery over the raw text
//!
//! The result of step 3 or 4 always goes through
//! [`crate::pipeline::normalize::normalize`].
//!
//! ## Fallback rules
//!
//! The fallback is an ordered table of `(field, patterns)` rules evaluated
//! independently: one field's miss never affects another. It is a
//! best-effort heuristic keyed on label synonyms ("passport", "name",
//! "birth", ...) and is not expected to be exact. A field whose patterns all
//! miss is `""`.

use crate::pipeline::normalize::normalize;
use crate::record::PassportData;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

static RE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)```").unwrap());

static RE_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// `D[D] MMM YYYY`, e.g. `05 JAN 1990`.
const DATE: &str = r"([0-9]{1,2}\s+[A-Z]{3}\s+[0-9]{4})";

/// One regex and the capture group holding the value (0 = whole match).
struct Pattern {
    re: Regex,
    group: usize,
}

struct FieldRule {
    key: &'static str,
    patterns: Vec<Pattern>,
}

impl FieldRule {
    fn new(key: &'static str, patterns: &[(&str, usize)]) -> Self {
        Self {
            key,
            patterns: patterns
                .iter()
                .map(|(src, group)| Pattern {
                    re: Regex::new(src).unwrap(),
                    group: *group,
                })
                .collect(),
        }
    }

    fn extract(&self, text: &str) -> String {
        self.patterns
            .iter()
            .find_map(|p| {
                p.re.captures(text)
                    .and_then(|c| c.get(p.group))
                    .map(|m| clean_capture(m.as_str()))
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_default()
    }
}

static FALLBACK_RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    vec![
        FieldRule::new(
            "passportNo",
            &[
                (r#"(?i)passport[^:]*:\s*"?([A-Z0-9]{6,12})"#, 1),
                // Bare document-number shape; case-sensitive on purpose.
                (r"[A-Z]{1,2}[0-9]{7,9}", 0),
            ],
        ),
        FieldRule::new(
            "fullName",
            &[(r#"(?i)(?:name|surname)[^:]*:\s*"?([^"\n,]+(?:,\s*[^"\n,]+)?)"#, 1)],
        ),
        FieldRule::new("dateOfBirth", &[(format!(r#"(?i)birth[^:]*:\s*"?{DATE}"#).as_str(), 1)]),
        FieldRule::new("placeOfBirth", &[(r#"(?i)place[^:]*:\s*"?([^"\n,]+)"#, 1)]),
        FieldRule::new("dateOfIssue", &[(format!(r#"(?i)issue[^:]*:\s*"?{DATE}"#).as_str(), 1)]),
        FieldRule::new("dateOfExpiry", &[(format!(r#"(?i)expir[^:]*:\s*"?{DATE}"#).as_str(), 1)]),
        FieldRule::new("nationality", &[(r#"(?i)nationality[^:]*:\s*"?([A-Z]{2,3})"#, 1)]),
        FieldRule::new("gender", &[(r#"(?i)gender[^:]*:\s*"?(Male|Female)"#, 1)]),
        FieldRule::new(
            "issuingAuthority",
            &[(r#"(?i)(?:authority|issued by)[^:]*:\s*"?([^"\n,]+)"#, 1)],
        ),
    ]
});

/// Parse raw model output into a normalized record. Never fails.
pub fn parse_response(raw: &str) -> PassportData {
    let candidate = candidate_json(raw);
    match serde_json::from_str::<Value>(&candidate) {
        Ok(value) => {
            debug!("Strict JSON parse succeeded");
            normalize(&value)
        }
        Err(e) => {
            warn!("JSON parse failed ({}), using regex fallback", e);
            debug!("Unparseable content: {}", preview(&candidate, 300));
            normalize(&fallback_extract(raw))
        }
    }
}

/// Steps 1–2: fence stripping, then the greedy brace span.
pub fn candidate_json(raw: &str) -> String {
    let text = strip_code_fence(raw.trim());
    match RE_OBJECT.find(&text) {
        Some(m) => m.as_str().to_string(),
        None => text,
    }
}

/// Content of the first fenced block, or the input unchanged.
pub fn strip_code_fence(text: &str) -> String {
    if !text.contains("```") {
        return text.to_string();
    }
    match RE_FENCE.captures(text) {
        Some(caps) => caps[1].trim().to_string(),
        None => text.to_string(),
    }
}

/// Step 4: independent per-field regex recovery.
///
/// Returns a JSON object with all nine keys, empty where nothing matched.
pub fn fallback_extract(raw: &str) -> Value {
    let mut obj = Map::new();
    for rule in FALLBACK_RULES.iter() {
        obj.insert(rule.key.to_string(), Value::String(rule.extract(raw)));
    }
    Value::Object(obj)
}

fn clean_capture(s: &str) -> String {
    s.trim()
        .replace('"', "")
        .trim_end_matches(',')
        .trim()
        .to_string()
}

fn preview(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
