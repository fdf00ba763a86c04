//! Data quality checks covering missing values, duplicates, outliers,
//! timestamp anomalies, and distribution drift.

use crate::config::QualityConfig;
use crate::dataset::value::{Record, as_number, is_empty_value, numeric_fields, parse_timestamp};
use crate::stats::{mean, percentile, round2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Quality metrics and the derived score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    #[serde(rename = "quality_score")]
    pub score: f64,
    pub violations: Vec<String>,
    #[serde(rename = "recommended_fixes")]
    pub recommendations: Vec<String>,
}

/// Quality checker over an in-memory batch, with a baseline for drift.
pub struct QualityChecker {
    drift_threshold: f64,
    iqr_multiplier: f64,
    min_outlier_samples: usize,
}

impl Default for QualityChecker {
    fn default() -> Self {
        Self::new(&QualityConfig::default())
    }
}

impl QualityChecker {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            drift_threshold: config.drift_threshold,
            iqr_multiplier: config.iqr_multiplier,
            min_outlier_samples: config.min_outlier_samples,
        }
    }

    /// Run all checks and fold the findings into a single report.
    pub fn generate_report(&self, records: &[Record], baseline: &[Record]) -> QualityReport {
        if records.is_empty() {
            tracing::warn!("quality report requested for empty record set");
            return QualityReport {
                score: 0.0,
                violations: vec!["No records supplied".to_string()],
                recommendations: vec!["Provide at least one record to assess quality".to_string()],
            };
        }

        let mut violations = Vec::new();
        let mut recommendations = Vec::new();

        let (missing, missing_messages) = detect_missing(records);
        violations.extend(missing_messages);

        let (duplicate_count, duplicate_messages) = detect_duplicates(records);
        violations.extend(duplicate_messages);

        let fields = numeric_fields(records);
        let outlier_messages = self.detect_outliers(records, &fields);
        violations.extend(outlier_messages.iter().cloned());

        violations.extend(detect_timestamp_anomalies(records));

        let drift_messages = self.detect_distribution_drift(records, baseline, &fields);
        violations.extend(drift_messages.iter().cloned());

        if missing > 0 {
            recommendations.push("Fill missing values or remove affected records".to_string());
        }
        if duplicate_count > 0 {
            recommendations.push("Deduplicate dataset before training".to_string());
        }
        if !outlier_messages.is_empty() {
            recommendations.push("Winsorize or investigate outliers".to_string());
        }
        if !drift_messages.is_empty() {
            recommendations
                .push("Recompute baseline or retrain model with new distribution".to_string());
        }

        let penalty = (violations.len() * 2 + missing + duplicate_count * 5).min(100);
        let score = (100 - penalty) as f64;
        tracing::info!(score, "quality score computed");
        QualityReport {
            score: round2(score),
            violations,
            recommendations,
        }
    }

    fn detect_outliers(&self, records: &[Record], fields: &[String]) -> Vec<String> {
        let mut issues = Vec::new();
        for field in fields {
            let values: Vec<f64> = records
                .iter()
                .filter_map(|r| r.get(field).and_then(as_number))
                .collect();
            if values.len() < self.min_outlier_samples {
                continue;
            }
            let q1 = percentile(&values, 25.0);
            let q3 = percentile(&values, 75.0);
            let iqr = q3 - q1;
            let lower = q1 - self.iqr_multiplier * iqr;
            let upper = q3 + self.iqr_multiplier * iqr;
            for (pos, value) in values.iter().enumerate() {
                if *value < lower || *value > upper {
                    issues.push(format!("Outlier in {field} value {value} at position {pos}"));
                }
            }
        }
        issues
    }

    fn detect_distribution_drift(
        &self,
        records: &[Record],
        baseline: &[Record],
        fields: &[String],
    ) -> Vec<String> {
        let mut messages = Vec::new();
        for field in fields {
            let current: Vec<f64> = records
                .iter()
                .filter_map(|r| r.get(field).and_then(as_number))
                .collect();
            let base: Vec<f64> = baseline
                .iter()
                .filter_map(|r| r.get(field).and_then(as_number))
                .collect();
            if current.is_empty() || base.is_empty() {
                continue;
            }
            let base_mean = mean(&base);
            if base_mean == 0.0 {
                continue;
            }
            let shift = (mean(&current) - base_mean).abs() / base_mean.abs();
            if shift > self.drift_threshold {
                messages.push(format!(
                    "Distribution drift detected in {field}: {shift:.2} relative change"
                ));
            }
        }
        messages
    }
}

fn detect_missing(records: &[Record]) -> (usize, Vec<String>) {
    let mut missing = 0;
    let mut violations = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        for (key, value) in record {
            if is_empty_value(value) {
                missing += 1;
                violations.push(format!("Record {idx} missing value in {key}"));
            }
        }
    }
    (missing, violations)
}

fn detect_duplicates(records: &[Record]) -> (usize, Vec<String>) {
    // Canonical form: key-sorted serialization of the whole record.
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        let canonical = serde_json::to_string(record).unwrap_or_default();
        *counts.entry(canonical).or_insert(0) += 1;
    }
    let duplicates = counts.values().filter(|&&count| count > 1).count();
    if duplicates == 0 {
        (0, Vec::new())
    } else {
        (duplicates, vec!["Duplicate records detected".to_string()])
    }
}

/// Timestamp scan over fields whose name mentions time or date. Unparsable
/// values and order inversions (adjacent decreasing pairs in arrival order)
/// are each reported individually.
fn detect_timestamp_anomalies(records: &[Record]) -> Vec<String> {
    let fields: Vec<String> = records
        .first()
        .map(|record| {
            record
                .keys()
                .filter(|key| key.contains("time") || key.contains("date"))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    let mut anomalies = Vec::new();
    for field in &fields {
        let mut timestamps = Vec::new();
        for record in records {
            let Some(value) = record.get(field) else {
                continue;
            };
            let raw = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            match parse_timestamp(&raw) {
                Some(ts) => timestamps.push(ts),
                None => anomalies.push(format!("Invalid timestamp format in field {field}")),
            }
        }
        for pair in timestamps.windows(2) {
            if pair[1] < pair[0] {
                anomalies.push(format!("Timestamp order anomaly in field {field}"));
            }
        }
    }
    anomalies
}
