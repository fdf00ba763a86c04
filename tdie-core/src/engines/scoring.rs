//! Composite integrity scoring combining quality, poisoning, bias, schema,
//! and provenance signals.

use crate::engines::schema::{Severity, Violation};
use crate::stats::round2;
use serde::{Deserialize, Serialize};

/// Severity tier derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeverityTier {
    Low,
    Medium,
    High,
    Critical,
}

/// Recommended action for the scored dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Pass,
    Review,
    Block,
}

/// Composite score plus the derived tier and decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdieResult {
    pub tdie_score: f64,
    pub severity: SeverityTier,
    pub decision: Decision,
}

fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Error => 30.0,
        Severity::Warn => 10.0,
        Severity::Info => 0.0,
    }
}

/// Aggregate the integrity signals into the composite score.
///
/// The base is the mean of the quality, bias, and provenance scores; the
/// poisoning risk and the severity-weighted schema penalty subtract from it,
/// and the result is clamped to [0, 100].
pub fn compute_tdie_score(
    quality_score: f64,
    poisoning_risk: f64,
    bias_score: f64,
    schema_violations: &[Violation],
    provenance_completeness: f64,
) -> TdieResult {
    let schema_penalty: f64 = schema_violations
        .iter()
        .map(|v| severity_weight(v.severity))
        .sum();
    let base = (quality_score + bias_score + provenance_completeness) / 3.0;
    let raw = (base - poisoning_risk - schema_penalty).max(0.0);
    let score = raw.min(100.0);
    let severity = severity_tier(score);
    let decision = decision_gate(score, schema_violations.len());
    tracing::info!(score, severity = ?severity, "composite integrity score computed");
    TdieResult {
        tdie_score: round2(score),
        severity,
        decision,
    }
}

/// Map a composite score to a severity tier.
pub fn severity_tier(score: f64) -> SeverityTier {
    if score >= 80.0 {
        SeverityTier::Low
    } else if score >= 60.0 {
        SeverityTier::Medium
    } else if score >= 40.0 {
        SeverityTier::High
    } else {
        SeverityTier::Critical
    }
}

/// Recommended action from the score and the violation count.
pub fn decision_gate(score: f64, schema_violations: usize) -> Decision {
    if score < 40.0 || schema_violations > 5 {
        Decision::Block
    } else if score < 60.0 {
        Decision::Review
    } else {
        Decision::Pass
    }
}
