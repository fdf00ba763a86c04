//! Poisoning-risk heuristics: label flips, cluster anomalies, embedding
//! drift, bias injection, and trigger patterns.
//!
//! These are synthetic-safe heuristics, not production-grade ML security.
//! Every stochastic step runs from a fixed seed so repeated invocations over
//! the same batch report identical suspects.

use crate::cluster::k_means;
use crate::dataset::value::{Record, coerce_f64, numeric_fields};
use crate::stats::{euclidean_norm, mean, round2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

const CLUSTER_SEED: u64 = 42;
const CLUSTER_RESTARTS: usize = 5;
const BASELINE_ROWS: usize = 10;
const BASELINE_SPREAD: f64 = 0.5;

/// Per-heuristic signal detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoisonSignals {
    pub label_flips: Vec<usize>,
    pub cluster_outliers: Vec<usize>,
    pub embedding_drift: f64,
    pub bias_injection: Vec<usize>,
    pub rare_pattern: Vec<usize>,
}

/// Composite poisoning-risk result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoisonReport {
    pub poisoning_risk_score: f64,
    pub suspected_poison_samples: Vec<usize>,
    pub signals: PoisonSignals,
}

impl PoisonReport {
    fn zeroed() -> Self {
        Self {
            poisoning_risk_score: 0.0,
            suspected_poison_samples: Vec::new(),
            signals: PoisonSignals {
                label_flips: Vec::new(),
                cluster_outliers: Vec::new(),
                embedding_drift: 0.0,
                bias_injection: Vec::new(),
                rare_pattern: Vec::new(),
            },
        }
    }
}

/// Poisoning-risk detector.
pub struct PoisonDetector {
    label_field: String,
    sensitive_field: String,
}

impl Default for PoisonDetector {
    fn default() -> Self {
        Self {
            label_field: "label".to_string(),
            sensitive_field: "group".to_string(),
        }
    }
}

impl PoisonDetector {
    /// Run every heuristic and fold the hits into one risk score.
    pub fn compute_risk(&self, records: &[Record]) -> PoisonReport {
        if records.is_empty() {
            tracing::warn!("poison detection requested on empty record set");
            return PoisonReport::zeroed();
        }

        let fields = numeric_fields(records);
        let label_flips = self.detect_label_flips(records);
        let cluster_outliers = detect_cluster_anomalies(records, &fields);
        let drift = detect_embedding_drift(records, &fields);
        let bias_injection = self.detect_bias_injection(records);
        let rare_pattern = detect_rare_patterns(records);

        let suspects: BTreeSet<usize> = label_flips
            .iter()
            .chain(&cluster_outliers)
            .chain(&bias_injection)
            .chain(&rare_pattern)
            .copied()
            .collect();

        let risk = (10.0 * suspects.len() as f64 + drift).min(100.0);
        tracing::info!(risk, "poisoning risk computed");
        PoisonReport {
            poisoning_risk_score: round2(risk),
            suspected_poison_samples: suspects.into_iter().collect(),
            signals: PoisonSignals {
                label_flips,
                cluster_outliers,
                embedding_drift: drift,
                bias_injection,
                rare_pattern,
            },
        }
    }

    /// Indices whose label is a string marked as flipped.
    fn detect_label_flips(&self, records: &[Record]) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                matches!(
                    record.get(&self.label_field),
                    Some(Value::String(s)) if s.starts_with("flipped")
                )
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Indices whose sensitive attribute names the injected rare group.
    fn detect_bias_injection(&self, records: &[Record]) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                record
                    .get(&self.sensitive_field)
                    .is_some_and(|value| string_form(value).to_lowercase() == "rare_group")
            })
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Indices assigned to the smallest cluster(s) of a seeded k-means run over
/// the numeric columns. Skipped for fewer than 3 records or no numeric data.
fn detect_cluster_anomalies(records: &[Record], fields: &[String]) -> Vec<usize> {
    if records.len() < 3 || fields.is_empty() {
        return Vec::new();
    }
    let matrix = vectorize(records, fields);
    let k = 3.min(records.len());
    let assignments = k_means(&matrix, k, CLUSTER_RESTARTS, CLUSTER_SEED);

    let mut counts: HashMap<usize, usize> = HashMap::new();
    for &cluster in &assignments {
        *counts.entry(cluster).or_insert(0) += 1;
    }
    let Some(&smallest) = counts.values().min() else {
        return Vec::new();
    };
    assignments
        .iter()
        .enumerate()
        .filter(|(_, cluster)| counts[cluster] == smallest)
        .map(|(idx, _)| idx)
        .collect()
}

/// Euclidean distance between the batch's column-wise mean and a fixed-seed
/// baseline embedding. Zero when the batch has no numeric columns.
fn detect_embedding_drift(records: &[Record], fields: &[String]) -> f64 {
    if records.is_empty() || fields.is_empty() {
        return 0.0;
    }
    let matrix = vectorize(records, fields);
    let current_mean = column_means(&matrix, fields.len());
    let baseline_mean = baseline_embedding_mean(fields.len());

    let diff: Vec<f64> = current_mean
        .iter()
        .zip(&baseline_mean)
        .map(|(current, base)| current - base)
        .collect();
    euclidean_norm(&diff)
}

/// Indices where any field value's string form carries a trigger prefix.
fn detect_rare_patterns(records: &[Record]) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            record
                .values()
                .any(|value| string_form(value).starts_with("trigger"))
        })
        .map(|(idx, _)| idx)
        .collect()
}

fn vectorize(records: &[Record], fields: &[String]) -> Vec<Vec<f64>> {
    records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|field| record.get(field).map(coerce_f64).unwrap_or(0.0))
                .collect()
        })
        .collect()
}

fn column_means(matrix: &[Vec<f64>], columns: usize) -> Vec<f64> {
    (0..columns)
        .map(|col| {
            let values: Vec<f64> = matrix.iter().map(|row| row[col]).collect();
            mean(&values)
        })
        .collect()
}

/// Column-wise mean of a mean-zero, small-spread baseline embedding drawn
/// from the fixed seed.
fn baseline_embedding_mean(columns: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(CLUSTER_SEED);
    let rows: Vec<Vec<f64>> = (0..BASELINE_ROWS)
        .map(|_| {
            (0..columns)
                .map(|_| sample_normal(&mut rng, BASELINE_SPREAD))
                .collect()
        })
        .collect();
    column_means(&rows, columns)
}

/// Box-Muller draw from N(0, spread).
fn sample_normal(rng: &mut StdRng, spread: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.r#gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos() * spread
}

fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
