//! Bias and fairness integrity checks using synthetic-safe heuristics.

use crate::config::BiasConfig;
use crate::dataset::value::Record;
use crate::stats::{round2, round4, std_dev};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fairness gap metrics and the aggregated bias integrity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasReport {
    pub demographic_parity_gap: f64,
    pub equal_opportunity_gap: f64,
    pub pooled_fairness_index: f64,
    pub sensitive_feature_imbalance: f64,
    pub bias_integrity_score: f64,
}

impl BiasReport {
    fn zeroed() -> Self {
        Self {
            demographic_parity_gap: 0.0,
            equal_opportunity_gap: 0.0,
            pooled_fairness_index: 0.0,
            sensitive_feature_imbalance: 0.0,
            bias_integrity_score: 0.0,
        }
    }
}

/// Per-group label counts.
#[derive(Debug, Default)]
struct GroupCounts {
    positives: usize,
    total: usize,
}

impl GroupCounts {
    fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.positives as f64 / self.total as f64
        }
    }
}

/// Fairness metric engine over a sensitive attribute and a label field.
pub struct BiasEngine {
    sensitive_field: String,
    label_field: String,
}

impl Default for BiasEngine {
    fn default() -> Self {
        Self::new(&BiasConfig::default())
    }
}

impl BiasEngine {
    pub fn new(config: &BiasConfig) -> Self {
        Self {
            sensitive_field: config.sensitive_field.clone(),
            label_field: config.label_field.clone(),
        }
    }

    /// Compute fairness metrics and aggregate them into a bias integrity
    /// score. Empty input yields the all-zero report.
    pub fn run_checks(&self, records: &[Record]) -> BiasReport {
        if records.is_empty() {
            tracing::warn!("bias checks requested on empty record set");
            return BiasReport::zeroed();
        }

        let groups = self.group_metrics(records);
        let dp_gap = demographic_parity(&groups);
        let eo_gap = equal_opportunity(&groups);
        let pfi = pooled_fairness_index(&groups);
        let imbalance = imbalance(&groups);

        let bias_score = (100.0 - (dp_gap + eo_gap + pfi) * 50.0 - imbalance).max(0.0);
        tracing::info!(score = bias_score, "bias integrity score computed");
        BiasReport {
            demographic_parity_gap: round4(dp_gap),
            equal_opportunity_gap: round4(eo_gap),
            pooled_fairness_index: round4(pfi),
            sensitive_feature_imbalance: imbalance,
            bias_integrity_score: round2(bias_score),
        }
    }

    /// Aggregate per-group label counts. Records without the sensitive field
    /// fall into the `unknown` group; positive means the label is exactly 1.
    fn group_metrics(&self, records: &[Record]) -> BTreeMap<String, GroupCounts> {
        let mut groups: BTreeMap<String, GroupCounts> = BTreeMap::new();
        for record in records {
            let group = record
                .get(&self.sensitive_field)
                .map(group_key)
                .unwrap_or_else(|| "unknown".to_string());
            let counts = groups.entry(group).or_default();
            counts.total += 1;
            if is_positive_label(record.get(&self.label_field)) {
                counts.positives += 1;
            }
        }
        groups
    }
}

fn group_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_positive_label(label: Option<&Value>) -> bool {
    matches!(label, Some(Value::Number(n)) if n.as_f64() == Some(1.0))
}

/// Demographic parity gap: max minus min positive rate across groups.
fn demographic_parity(groups: &BTreeMap<String, GroupCounts>) -> f64 {
    gap(&rates(groups))
}

/// Equal opportunity gap across groups using observed positive rates.
fn equal_opportunity(groups: &BTreeMap<String, GroupCounts>) -> f64 {
    let rates: Vec<f64> = groups
        .values()
        .filter(|counts| counts.total > 0)
        .map(|counts| counts.positives as f64 / counts.total as f64)
        .collect();
    gap(&rates)
}

/// Pooled fairness index: population standard deviation of group rates.
fn pooled_fairness_index(groups: &BTreeMap<String, GroupCounts>) -> f64 {
    std_dev(&rates(groups))
}

/// Sensitive feature imbalance as the relative majority/minority difference,
/// in percent.
fn imbalance(groups: &BTreeMap<String, GroupCounts>) -> f64 {
    let sizes: Vec<usize> = groups.values().map(|counts| counts.total).collect();
    let Some(&majority) = sizes.iter().max() else {
        return 0.0;
    };
    let Some(&minority) = sizes.iter().min() else {
        return 0.0;
    };
    if majority == 0 {
        return 0.0;
    }
    round2((majority - minority) as f64 / majority as f64 * 100.0)
}

fn rates(groups: &BTreeMap<String, GroupCounts>) -> Vec<f64> {
    groups
        .values()
        .filter(|counts| counts.total > 0)
        .map(GroupCounts::rate)
        .collect()
}

fn gap(rates: &[f64]) -> f64 {
    let max = rates.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = rates.iter().cloned().fold(f64::INFINITY, f64::min);
    if rates.is_empty() { 0.0 } else { max - min }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_records_all_zero() {
        let report = BiasEngine::default().run_checks(&[]);
        assert_eq!(report, BiasReport::zeroed());
    }

    #[test]
    fn test_parity_gap_across_groups() {
        // Group A: rate 1.0, group B: rate 0.0.
        let batch = records(json!([
            {"group": "A", "label": 1},
            {"group": "A", "label": 1},
            {"group": "B", "label": 0}
        ]));
        let report = BiasEngine::default().run_checks(&batch);
        assert_eq!(report.demographic_parity_gap, 1.0);
        assert_eq!(report.equal_opportunity_gap, 1.0);
        assert_eq!(report.pooled_fairness_index, 0.5);
        assert_eq!(report.sensitive_feature_imbalance, 50.0);
        // 100 - (1 + 1 + 0.5) * 50 - 50 clamps to 0.
        assert_eq!(report.bias_integrity_score, 0.0);
    }

    #[test]
    fn test_balanced_groups_score_full() {
        let batch = records(json!([
            {"group": "A", "label": 1},
            {"group": "A", "label": 0},
            {"group": "B", "label": 1},
            {"group": "B", "label": 0}
        ]));
        let report = BiasEngine::default().run_checks(&batch);
        assert_eq!(report.demographic_parity_gap, 0.0);
        assert_eq!(report.sensitive_feature_imbalance, 0.0);
        assert_eq!(report.bias_integrity_score, 100.0);
    }

    #[test]
    fn test_missing_sensitive_field_groups_as_unknown() {
        let batch = records(json!([
            {"label": 1},
            {"group": "A", "label": 1}
        ]));
        let report = BiasEngine::default().run_checks(&batch);
        // Both groups (A and unknown) have rate 1.0.
        assert_eq!(report.demographic_parity_gap, 0.0);
        assert_eq!(report.bias_integrity_score, 100.0);
    }

    #[test]
    fn test_label_must_be_exactly_one() {
        let batch = records(json!([
            {"group": "A", "label": 1},
            {"group": "B", "label": 2},
            {"group": "C", "label": "1"},
            {"group": "D", "label": true}
        ]));
        let report = BiasEngine::default().run_checks(&batch);
        // Only group A counts a positive.
        assert_eq!(report.demographic_parity_gap, 1.0);
    }

    #[test]
    fn test_equal_opportunity_mirrors_parity_on_observed_rates() {
        let batch = records(json!([
            {"group": "A", "label": 1},
            {"group": "A", "label": 0},
            {"group": "B", "label": 0},
            {"group": "B", "label": 0},
            {"group": "B", "label": 1}
        ]));
        let report = BiasEngine::default().run_checks(&batch);
        assert_eq!(
            report.demographic_parity_gap,
            report.equal_opportunity_gap
        );
    }

    #[test]
    fn test_idempotent_over_same_records() {
        let batch = records(json!([
            {"group": "A", "label": 1},
            {"group": "B", "label": 0},
            {"group": "B", "label": 1}
        ]));
        let engine = BiasEngine::default();
        let first = engine.run_checks(&batch);
        let second = engine.run_checks(&batch);
        assert_eq!(first, second);
    }
}
