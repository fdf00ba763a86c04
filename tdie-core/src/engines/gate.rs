//! Training guardrail mapping composite scores to go/no-go decisions.

use crate::engines::scoring::Decision;
use crate::history::HistoryStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

/// Guardrail policy strictness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GuardrailLevel {
    #[default]
    Strict,
    Moderate,
    Permissive,
}

impl FromStr for GuardrailLevel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_uppercase().as_str() {
            "STRICT" => Ok(Self::Strict),
            "MODERATE" => Ok(Self::Moderate),
            "PERMISSIVE" => Ok(Self::Permissive),
            other => Err(format!("unknown guardrail level {other}")),
        }
    }
}

/// Outcome of a guardrail evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailDecision {
    pub decision: Decision,
    pub level: GuardrailLevel,
    pub reason: String,
}

/// Guardrail gate. Every decision is appended to the audit history; a
/// persistence failure is logged and never blocks the decision itself.
pub struct TrainingGate {
    audit: Arc<dyn HistoryStore>,
}

impl TrainingGate {
    pub fn new(audit: Arc<dyn HistoryStore>) -> Self {
        Self { audit }
    }

    /// Decide whether training may proceed for the given composite score.
    pub fn decide(
        &self,
        tdie_score: f64,
        level: GuardrailLevel,
        threshold: f64,
    ) -> GuardrailDecision {
        let safe_score = tdie_score.max(0.0);
        let safe_threshold = threshold.max(0.0);
        let (decision, reason) = match level {
            GuardrailLevel::Permissive => (Decision::Pass, "Permissive mode logs only"),
            GuardrailLevel::Moderate => {
                let decision = if safe_score < safe_threshold {
                    Decision::Review
                } else {
                    Decision::Pass
                };
                (decision, "Moderate guardrail requires approval on low scores")
            }
            GuardrailLevel::Strict => {
                let decision = if safe_score < safe_threshold {
                    Decision::Block
                } else {
                    Decision::Pass
                };
                (decision, "Strict mode blocks scores below threshold")
            }
        };

        let outcome = GuardrailDecision {
            decision,
            level,
            reason: reason.to_string(),
        };
        self.audit_decision(safe_score, &outcome);
        outcome
    }

    fn audit_decision(&self, score: f64, outcome: &GuardrailDecision) {
        let entry = json!({
            "tdie_score": score,
            "level": outcome.level,
            "decision": outcome.decision,
            "reason": outcome.reason,
            "decided_at": Utc::now(),
        });
        if let Err(error) = self.audit.append(&entry) {
            tracing::error!(%error, "failed to write training audit entry");
        } else {
            tracing::info!(decision = ?outcome.decision, "training audit entry written");
        }
    }
}
