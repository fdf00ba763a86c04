//! Record values and per-field type classification.
//!
//! Field kinds are determined once at ingestion and consumed by the quality
//! and poison checks without re-inspecting every value.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single dataset record. Extra keys beyond the contract are permitted.
pub type Record = serde_json::Map<String, Value>;

/// Classified kind of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Int,
    Float,
    Str,
    Bool,
    Timestamp,
    Other,
}

impl ValueKind {
    /// Whether values of this kind participate in numeric checks.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

/// Classify a single JSON value.
pub fn classify(value: &Value) -> ValueKind {
    match value {
        Value::Number(n) if n.is_f64() => ValueKind::Float,
        Value::Number(_) => ValueKind::Int,
        Value::Bool(_) => ValueKind::Bool,
        Value::String(s) if parse_timestamp(s).is_some() => ValueKind::Timestamp,
        Value::String(_) => ValueKind::Str,
        _ => ValueKind::Other,
    }
}

/// Field kinds taken from the first record of a batch.
pub fn field_kinds(records: &[Record]) -> BTreeMap<String, ValueKind> {
    records
        .first()
        .map(|record| {
            record
                .iter()
                .map(|(key, value)| (key.clone(), classify(value)))
                .collect()
        })
        .unwrap_or_default()
}

/// Names of the numeric fields of a batch, from the first record's kinds.
pub fn numeric_fields(records: &[Record]) -> Vec<String> {
    field_kinds(records)
        .into_iter()
        .filter(|(_, kind)| kind.is_numeric())
        .map(|(name, _)| name)
        .collect()
}

/// True for the empty forms a record slot can take: null, empty string,
/// empty array, empty object.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Strict numeric view: integers and floats only, booleans excluded.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Best-effort numeric coercion for bound checks and vectorization.
/// Non-coercible values become 0.0.
pub fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse an ISO-8601 timestamp: RFC 3339 with offset, naive datetime with
/// `T` or space separator, or a bare date (interpreted as midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_excludes_bool_from_numeric() {
        assert_eq!(classify(&json!(3)), ValueKind::Int);
        assert_eq!(classify(&json!(3.5)), ValueKind::Float);
        assert_eq!(classify(&json!(true)), ValueKind::Bool);
        assert!(!classify(&json!(true)).is_numeric());
        assert!(classify(&json!(3)).is_numeric());
    }

    #[test]
    fn test_classify_timestamp_string() {
        assert_eq!(
            classify(&json!("2024-01-01T00:00:00")),
            ValueKind::Timestamp
        );
        assert_eq!(classify(&json!("not a date")), ValueKind::Str);
        assert_eq!(classify(&json!(null)), ValueKind::Other);
    }

    #[test]
    fn test_numeric_fields_from_first_record() {
        let records: Vec<Record> = vec![
            serde_json::from_value(json!({"id": 1, "value": 2.5, "group": "A", "ok": true}))
                .unwrap(),
        ];
        assert_eq!(numeric_fields(&records), vec!["id", "value"]);
        assert!(numeric_fields(&[]).is_empty());
    }

    #[test]
    fn test_is_empty_value() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!([])));
        assert!(is_empty_value(&json!({})));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!("x")));
    }

    #[test]
    fn test_coerce_f64() {
        assert_eq!(coerce_f64(&json!(2)), 2.0);
        assert_eq!(coerce_f64(&json!(true)), 1.0);
        assert_eq!(coerce_f64(&json!("12.5")), 12.5);
        assert_eq!(coerce_f64(&json!("garbage")), 0.0);
        assert_eq!(coerce_f64(&json!([1])), 0.0);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-01-01T00:00:00").is_some());
        assert!(parse_timestamp("2024-01-01 12:30:45.250").is_some());
        assert!(parse_timestamp("2024-01-01").is_some());
        assert!(parse_timestamp("2024-01-01T00:00:00+02:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_parse_timestamp_ordering() {
        let earlier = parse_timestamp("2024-01-01T00:00:00").unwrap();
        let later = parse_timestamp("2024-01-02").unwrap();
        assert!(earlier < later);
    }
}
