//! Evidence bundle export capability.

use crate::error::TdieError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Renders a flat key-value report into a durable, human-readable artifact
/// and returns its location.
pub trait EvidenceExporter: Send + Sync {
    fn export(&self, report: &Map<String, Value>, path: &Path) -> Result<PathBuf, TdieError>;
}

/// Plain-text exporter: a titled `key: value` listing, written atomically.
#[derive(Debug, Default)]
pub struct TextEvidenceExporter;

impl EvidenceExporter for TextEvidenceExporter {
    fn export(&self, report: &Map<String, Value>, path: &Path) -> Result<PathBuf, TdieError> {
        let mut lines = vec![
            "Training Data Integrity Engine Evidence Bundle".to_string(),
            String::new(),
        ];
        for (key, value) in report {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(format!("{key}: {rendered}"));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, lines.join("\n"))?;
        std::fs::rename(&tmp, path)?;
        tracing::info!(path = %path.display(), "evidence bundle written");
        Ok(path.to_path_buf())
    }
}
