//! Provenance capture and lineage completeness scoring.

use crate::error::TdieError;
use crate::history::HistoryStore;
use crate::stats::round2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Metadata keys a complete lineage record carries.
const EXPECTED_KEYS: [&str; 4] = ["source", "user", "transformation_steps", "schema_version"];

/// A recorded lineage entry. Append-only; never mutated after recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub source: String,
    pub user: String,
    pub transformation_steps: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

/// Lineage recorder writing through an injected history store.
pub struct ProvenanceTracker {
    store: Arc<dyn HistoryStore>,
}

impl ProvenanceTracker {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Append a timestamped lineage entry and return it.
    pub fn record(
        &self,
        source: &str,
        user: &str,
        transformation_steps: Vec<String>,
        metadata: Map<String, Value>,
    ) -> Result<ProvenanceEntry, TdieError> {
        let entry = ProvenanceEntry {
            source: source.to_string(),
            user: user.to_string(),
            transformation_steps,
            timestamp: Utc::now(),
            metadata,
        };
        self.store.append(&serde_json::to_value(&entry)?)?;
        tracing::info!(source, "provenance captured");
        Ok(entry)
    }
}

/// Fraction (in percent) of the expected lineage keys that are present and
/// non-empty in the given metadata.
pub fn completeness(metadata: &Map<String, Value>) -> f64 {
    let present = EXPECTED_KEYS
        .iter()
        .filter(|key| metadata.get(**key).is_some_and(is_truthy))
        .count();
    round2(present as f64 / EXPECTED_KEYS.len() as f64 * 100.0)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::JsonHistoryStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn metadata(value: Value) -> Map<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_completeness_full() {
        let meta = metadata(json!({
            "source": "s3://bucket/data",
            "user": "alice",
            "transformation_steps": ["scaling"],
            "schema_version": "1.0"
        }));
        assert_eq!(completeness(&meta), 100.0);
    }

    #[test]
    fn test_completeness_partial() {
        let meta = metadata(json!({"source": "synthetic", "user": "bob"}));
        assert_eq!(completeness(&meta), 50.0);
    }

    #[test]
    fn test_completeness_ignores_empty_values() {
        let meta = metadata(json!({
            "source": "",
            "user": "carol",
            "transformation_steps": [],
            "schema_version": "2.0"
        }));
        assert_eq!(completeness(&meta), 50.0);
    }

    #[test]
    fn test_completeness_empty_metadata() {
        assert_eq!(completeness(&Map::new()), 0.0);
    }

    #[test]
    fn test_record_appends_to_history() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonHistoryStore::new(dir.path().join("provenance.json")));
        let tracker = ProvenanceTracker::new(store.clone());

        let entry = tracker
            .record(
                "synthetic",
                "tester",
                vec!["scaling".to_string()],
                metadata(json!({"schema_version": "1.0"})),
            )
            .unwrap();
        assert_eq!(entry.source, "synthetic");

        tracker
            .record("warehouse", "tester", Vec::new(), Map::new())
            .unwrap();

        let history = store.read_all().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["source"], "synthetic");
        assert_eq!(history[1]["source"], "warehouse");
        assert!(history[0]["timestamp"].is_string());
    }
}
