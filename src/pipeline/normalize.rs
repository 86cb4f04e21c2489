//! The single choke point between model output and [`PassportData`].
//!
//! Whatever JSON the model produced (or the fallback reconstructed), only
//! the nine known keys are read, each coerced to a trimmed string. Missing
//! keys and falsy scalars (`null`, `false`, `0`) become `""`. The passport
//! number is uppercased.

use crate::record::PassportData;
use serde_json::Value;

/// Coerce an arbitrary JSON value into the nine-field record.
///
/// A non-object input yields an all-empty record.
pub fn normalize(value: &Value) -> PassportData {
    let mut data = PassportData::default();
    let Some(obj) = value.as_object() else {
        return data;
    };

    for key in PassportData::KEYS {
        let text = obj.get(key).map(coerce).unwrap_or_default();
        if let Some(slot) = data.field_mut(key) {
            *slot = text.trim().to_string();
        }
    }
    data.passport_no = data.passport_no.to_uppercase();
    data
}

fn coerce(v: &Value) -> String {
    match v {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_nine_fields_always_present() {
        let inputs = [
            json!(null),
            json!([]),
            json!("text"),
            json!({}),
            json!({"passportNo": null, "unrelated": 1}),
        ];
        for input in inputs {
            let v = serde_json::to_value(normalize(&input)).unwrap();
            let obj = v.as_object().unwrap();
            assert_eq!(obj.len(), 9, "input: {input}");
            assert!(obj.values().all(|x| x.is_string()), "input: {input}");
        }
    }

    #[test]
    fn passport_no_is_uppercased_and_trimmed() {
        let d = normalize(&json!({"passportNo": "  ab1234567 \n"}));
        assert_eq!(d.passport_no, "AB1234567");
    }

    #[test]
    fn other_fields_are_trimmed_not_uppercased() {
        let d = normalize(&json!({
            "fullName": "  Doe, Jane ",
            "gender": "Female",
            "nationality": "\tLAO"
        }));
        assert_eq!(d.full_name, "Doe, Jane");
        assert_eq!(d.gender, "Female");
        assert_eq!(d.nationality, "LAO");
    }

    #[test]
    fn scalars_are_coerced_to_text() {
        let d = normalize(&json!({"passportNo": 1234567, "gender": true}));
        assert_eq!(d.passport_no, "1234567");
        assert_eq!(d.gender, "true");
    }

    #[test]
    fn falsy_scalars_become_empty() {
        let d = normalize(&json!({
            "passportNo": 0,
            "gender": false,
            "nationality": 0.0,
            "placeOfBirth": null
        }));
        assert_eq!(d.passport_no, "");
        assert_eq!(d.gender, "");
        assert_eq!(d.nationality, "");
        assert_eq!(d.place_of_birth, "");
    }
}
