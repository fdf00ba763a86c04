//! Append-only history store capability.
//!
//! Provenance entries, dataset fingerprints, and training audit records all
//! go through the same injected store. The file-backed implementation keeps
//! each history as a single JSON array document with create-on-first-write
//! semantics; appends are serialized behind a mutex and written atomically
//! (tmp sibling then rename) so concurrent pipelines never interleave or
//! corrupt a document.

use crate::error::TdieError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only history of JSON entries.
pub trait HistoryStore: Send + Sync {
    /// Append one entry. Never overwrites previous entries.
    fn append(&self, entry: &Value) -> Result<(), TdieError>;

    /// Read the full history, oldest first. Absent history reads as empty.
    fn read_all(&self) -> Result<Vec<Value>, TdieError>;
}

/// File-backed history store holding a single JSON array document.
pub struct JsonHistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Value>, TdieError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, entries: &[Value]) -> Result<(), TdieError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn append(&self, entry: &Value) -> Result<(), TdieError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| TdieError::persistence("history lock poisoned"))?;
        let mut entries = self.load()?;
        entries.push(entry.clone());
        self.write(&entries)
    }

    fn read_all(&self) -> Result<Vec<Value>, TdieError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| TdieError::persistence("history lock poisoned"))?;
        self.load()
    }
}
