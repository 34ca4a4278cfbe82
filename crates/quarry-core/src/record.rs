use serde_json::{Map, Value};

use crate::error::RecordError;

/// A single dataset record: a JSON object keyed by field name. Records
/// conform to a schema loosely; a missing field reads as absent, never as
/// an error.
pub type Record = Map<String, Value>;

/// Decode a record-set document: a JSON array of objects.
pub fn parse_record_set(json: &str) -> Result<Vec<Record>, RecordError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(RecordError::NotAnArray);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(RecordError::NotAnObject { index }),
        })
        .collect()
}

/// The display-text form of a record value. Scalars stringify (integers
/// without a trailing `.0`), arrays of scalars join with `", "`, and null or
/// container-valued entries read as absent.
pub fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(items) => {
            let parts: Option<Vec<String>> = items
                .iter()
                .map(|item| match item {
                    Value::Array(_) | Value::Object(_) => None,
                    other => display_text(other),
                })
                .collect();
            parts.map(|parts| parts.join(", "))
        }
        Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_set_round_trips() {
        let records = parse_record_set(r#"[{"title": "Dune", "year": 1965}]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["title"], json!("Dune"));
    }

    #[test]
    fn record_set_must_be_an_array() {
        assert!(matches!(
            parse_record_set(r#"{"title": "Dune"}"#),
            Err(RecordError::NotAnArray)
        ));
    }

    #[test]
    fn record_set_rejects_scalar_entries() {
        assert!(matches!(
            parse_record_set(r#"[{"a": 1}, 2]"#),
            Err(RecordError::NotAnObject { index: 1 })
        ));
    }

    #[test]
    fn display_text_shapes() {
        assert_eq!(display_text(&json!("x")), Some("x".to_string()));
        assert_eq!(display_text(&json!(3)), Some("3".to_string()));
        assert_eq!(display_text(&json!(2.5)), Some("2.5".to_string()));
        assert_eq!(display_text(&json!(null)), None);
        assert_eq!(
            display_text(&json!(["Crime", "Drama"])),
            Some("Crime, Drama".to_string())
        );
        assert_eq!(display_text(&json!({"nested": true})), None);
    }
}
