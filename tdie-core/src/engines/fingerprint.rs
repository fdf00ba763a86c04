//! Dataset fingerprinting and tamper detection.

use crate::dataset::value::Record;
use crate::error::TdieError;
use crate::hash::{hash_dataset, hash_features};
use crate::history::HistoryStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Content hashes for a dataset and each of its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub dataset_hash: String,
    pub feature_hashes: BTreeMap<String, String>,
    pub generated_at: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

/// Fingerprint engine backed by an append-only checksum history.
pub struct FingerprintEngine {
    store: Arc<dyn HistoryStore>,
}

impl FingerprintEngine {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Compute dataset-level and feature-level fingerprints, append the
    /// result to the checksum history, and return it.
    pub fn fingerprint(
        &self,
        records: &[Record],
        metadata: Map<String, Value>,
    ) -> Result<FingerprintRecord, TdieError> {
        let record = FingerprintRecord {
            dataset_hash: hash_dataset(records),
            feature_hashes: hash_features(records),
            generated_at: Utc::now(),
            metadata,
        };
        self.store.append(&serde_json::to_value(&record)?)?;
        tracing::info!(hash = %record.dataset_hash, "fingerprint stored");
        Ok(record)
    }

    /// Tamper check against the most recently appended fingerprint only.
    /// Absent, empty, or unreadable history reads as untampered.
    pub fn detect_tampering(&self, new_hash: &str) -> bool {
        let Ok(entries) = self.store.read_all() else {
            return false;
        };
        match entries.last().and_then(|entry| entry.get("dataset_hash")) {
            Some(Value::String(last_hash)) => last_hash != new_hash,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::JsonHistoryStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn records(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    fn engine(dir: &TempDir) -> FingerprintEngine {
        FingerprintEngine::new(Arc::new(JsonHistoryStore::new(
            dir.path().join("checksum_history.json"),
        )))
    }

    #[test]
    fn test_fingerprint_round_trip_not_tampered() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let batch = records(json!([{"id": 1, "value": 2.5}]));

        let fingerprint = engine.fingerprint(&batch, Map::new()).unwrap();
        assert!(!engine.detect_tampering(&fingerprint.dataset_hash));
        assert!(engine.detect_tampering("a-different-hash"));
    }

    #[test]
    fn test_no_history_is_not_tampering() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        assert!(!engine.detect_tampering("anything"));
    }

    #[test]
    fn test_unreadable_history_is_not_tampering() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checksum_history.json");
        std::fs::write(&path, "{ not json").unwrap();
        let engine = FingerprintEngine::new(Arc::new(JsonHistoryStore::new(path)));
        assert!(!engine.detect_tampering("anything"));
    }

    #[test]
    fn test_tamper_compares_against_tail_only() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let first = engine
            .fingerprint(&records(json!([{"id": 1}])), Map::new())
            .unwrap();
        let second = engine
            .fingerprint(&records(json!([{"id": 2}])), Map::new())
            .unwrap();

        assert!(engine.detect_tampering(&first.dataset_hash));
        assert!(!engine.detect_tampering(&second.dataset_hash));
    }

    #[test]
    fn test_identical_batches_share_hashes() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let batch = records(json!([{"id": 1, "group": "A"}]));
        let a = engine.fingerprint(&batch, Map::new()).unwrap();
        let b = engine.fingerprint(&batch, Map::new()).unwrap();
        assert_eq!(a.dataset_hash, b.dataset_hash);
        assert_eq!(a.feature_hashes, b.feature_hashes);
    }
}
