//! Content hashing over canonical JSON for dataset fingerprints.
//!
//! Serialization is key-sorted (serde_json object maps are ordered by key)
//! and order-preserving across records, so identical datasets always produce
//! identical digests.

use crate::dataset::value::Record;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// SHA-256 of a single record's canonical serialization.
pub fn hash_record(record: &Record) -> String {
    let stable = serde_json::to_string(record).unwrap_or_default();
    sha256_hex(stable.as_bytes())
}

/// SHA-256 over the ordered sequence of records.
pub fn hash_dataset(records: &[Record]) -> String {
    let stable = serde_json::to_string(records).unwrap_or_default();
    sha256_hex(stable.as_bytes())
}

/// Per-field SHA-256 over the ordered sequence of that field's values
/// across all records.
pub fn hash_features(records: &[Record]) -> BTreeMap<String, String> {
    let mut columns: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
    for record in records {
        for (key, value) in record {
            columns.entry(key.clone()).or_default().push(value);
        }
    }
    columns
        .into_iter()
        .map(|(key, values)| {
            let stable = serde_json::to_string(&values).unwrap_or_default();
            (key, sha256_hex(stable.as_bytes()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_hash_is_key_order_insensitive() {
        let a = record(json!({"id": 1, "value": 2.0}));
        let b: Record = serde_json::from_str(r#"{"value": 2.0, "id": 1}"#).unwrap();
        assert_eq!(hash_record(&a), hash_record(&b));
    }

    #[test]
    fn test_hash_dataset_is_record_order_sensitive() {
        let a = record(json!({"id": 1}));
        let b = record(json!({"id": 2}));
        assert_ne!(
            hash_dataset(&[a.clone(), b.clone()]),
            hash_dataset(&[b, a])
        );
    }

    #[test]
    fn test_hash_features_per_column() {
        let records = vec![
            record(json!({"id": 1, "group": "A"})),
            record(json!({"id": 2, "group": "B"})),
        ];
        let hashes = hash_features(&records);
        assert_eq!(hashes.len(), 2);
        assert!(hashes.contains_key("id"));
        assert!(hashes.contains_key("group"));
        assert_ne!(hashes["id"], hashes["group"]);
    }

    #[test]
    fn test_hash_changes_on_value_change() {
        let before = vec![record(json!({"id": 1}))];
        let after = vec![record(json!({"id": 2}))];
        assert_ne!(hash_dataset(&before), hash_dataset(&after));
    }
}
