//! Configuration types for the integrity pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TdieConfig {
    /// Append-only history file locations.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Quality checker thresholds.
    #[serde(default)]
    pub quality: QualityConfig,
    /// Fairness check field names.
    #[serde(default)]
    pub bias: BiasConfig,
    /// Training guardrail defaults.
    #[serde(default)]
    pub gate: GateConfig,
}

impl TdieConfig {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, crate::error::TdieError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Locations of the append-only history documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Provenance lineage log.
    #[serde(default = "default_provenance_log")]
    pub provenance_log: PathBuf,
    /// Dataset fingerprint history used for tamper detection.
    #[serde(default = "default_checksum_history")]
    pub checksum_history: PathBuf,
    /// Training gate audit trail.
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,
    /// Baseline dataset for drift comparison (optional, may be absent).
    #[serde(default = "default_baseline_path")]
    pub baseline: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            provenance_log: default_provenance_log(),
            checksum_history: default_checksum_history(),
            audit_log: default_audit_log(),
            baseline: default_baseline_path(),
        }
    }
}

fn default_provenance_log() -> PathBuf {
    PathBuf::from("provenance/provenance_log.json")
}

fn default_checksum_history() -> PathBuf {
    PathBuf::from("provenance/checksum_history.json")
}

fn default_audit_log() -> PathBuf {
    PathBuf::from("logs/training_audit.json")
}

fn default_baseline_path() -> PathBuf {
    PathBuf::from("data/baseline.json")
}

/// Quality checker thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Relative mean shift above which a numeric field counts as drifted.
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,
    /// IQR multiplier for the outlier fence.
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f64,
    /// Minimum numeric samples required before outlier detection runs.
    #[serde(default = "default_min_outlier_samples")]
    pub min_outlier_samples: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            drift_threshold: default_drift_threshold(),
            iqr_multiplier: default_iqr_multiplier(),
            min_outlier_samples: default_min_outlier_samples(),
        }
    }
}

fn default_drift_threshold() -> f64 {
    0.3
}

fn default_iqr_multiplier() -> f64 {
    1.5
}

fn default_min_outlier_samples() -> usize {
    4
}

/// Field names the fairness checks read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasConfig {
    /// Sensitive attribute used for grouping.
    #[serde(default = "default_sensitive_field")]
    pub sensitive_field: String,
    /// Label field holding the outcome.
    #[serde(default = "default_label_field")]
    pub label_field: String,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            sensitive_field: default_sensitive_field(),
            label_field: default_label_field(),
        }
    }
}

fn default_sensitive_field() -> String {
    "group".to_string()
}

fn default_label_field() -> String {
    "label".to_string()
}

/// Training guardrail defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Score threshold below which strict/moderate levels react.
    #[serde(default = "default_gate_threshold")]
    pub threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            threshold: default_gate_threshold(),
        }
    }
}

fn default_gate_threshold() -> f64 {
    60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TdieConfig::default();
        assert_eq!(config.quality.drift_threshold, 0.3);
        assert_eq!(config.quality.min_outlier_samples, 4);
        assert_eq!(config.bias.sensitive_field, "group");
        assert_eq!(config.gate.threshold, 60.0);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: TdieConfig =
            serde_json::from_str(r#"{"quality": {"drift_threshold": 0.5}}"#).unwrap();
        assert_eq!(config.quality.drift_threshold, 0.5);
        assert_eq!(config.quality.iqr_multiplier, 1.5);
        assert_eq!(config.bias.label_field, "label");
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = TdieConfig::load(Path::new("/nonexistent/tdie.json")).unwrap();
        assert_eq!(config.gate.threshold, 60.0);
    }
}
