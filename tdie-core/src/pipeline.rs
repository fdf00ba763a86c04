//! Pipeline wiring the engines into the operations callers invoke.
//!
//! Every operation consumes a raw JSON payload, runs the relevant engines,
//! and returns a plain serializable report. The pipeline owns the three
//! append-only histories (provenance, checksums, audit) through injected
//! stores; everything else is a pure function of the submitted batch.

use crate::config::TdieConfig;
use crate::dataset::loader::load_dataset;
use crate::dataset::value::Record;
use crate::engines::bias::{BiasEngine, BiasReport};
use crate::engines::fingerprint::{FingerprintEngine, FingerprintRecord};
use crate::engines::gate::{GuardrailDecision, GuardrailLevel, TrainingGate};
use crate::engines::poison::{PoisonDetector, PoisonReport};
use crate::engines::provenance::{self, ProvenanceEntry, ProvenanceTracker};
use crate::engines::quality::{QualityChecker, QualityReport};
use crate::engines::schema::{SchemaValidator, Violation};
use crate::engines::scoring::{TdieResult, compute_tdie_score};
use crate::error::TdieError;
use crate::evidence::{EvidenceExporter, TextEvidenceExporter};
use crate::hash::hash_dataset;
use crate::history::{HistoryStore, JsonHistoryStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Schema conformance plus data quality for a submitted dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub schema_violations: Vec<Violation>,
    #[serde(flatten)]
    pub quality: QualityReport,
}

/// Fingerprint of a submitted dataset plus the tamper flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintReport {
    #[serde(flatten)]
    pub record: FingerprintRecord,
    pub tamper_detected: bool,
}

/// Consolidated integrity assessment across every engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityAssessment {
    #[serde(flatten)]
    pub quality: QualityReport,
    pub schema_violations: Vec<Violation>,
    #[serde(flatten)]
    pub poison: PoisonReport,
    #[serde(flatten)]
    pub bias: BiasReport,
    pub provenance: ProvenanceEntry,
    pub provenance_completeness: f64,
    #[serde(flatten)]
    pub result: TdieResult,
}

/// The integrity pipeline. Stateless between invocations apart from the
/// append-only histories.
pub struct IntegrityPipeline {
    config: TdieConfig,
    quality: QualityChecker,
    bias: BiasEngine,
    poison: PoisonDetector,
    provenance: ProvenanceTracker,
    fingerprint: FingerprintEngine,
    gate: TrainingGate,
    exporter: TextEvidenceExporter,
}

impl IntegrityPipeline {
    /// Build a pipeline with file-backed history stores at the configured
    /// locations.
    pub fn new(config: TdieConfig) -> Self {
        let provenance: Arc<dyn HistoryStore> = Arc::new(JsonHistoryStore::new(
            config.history.provenance_log.clone(),
        ));
        let checksums: Arc<dyn HistoryStore> = Arc::new(JsonHistoryStore::new(
            config.history.checksum_history.clone(),
        ));
        let audit: Arc<dyn HistoryStore> =
            Arc::new(JsonHistoryStore::new(config.history.audit_log.clone()));
        Self::with_stores(config, provenance, checksums, audit)
    }

    /// Build a pipeline over injected history stores.
    pub fn with_stores(
        config: TdieConfig,
        provenance: Arc<dyn HistoryStore>,
        checksums: Arc<dyn HistoryStore>,
        audit: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            quality: QualityChecker::new(&config.quality),
            bias: BiasEngine::new(&config.bias),
            poison: PoisonDetector::default(),
            provenance: ProvenanceTracker::new(provenance),
            fingerprint: FingerprintEngine::new(checksums),
            gate: TrainingGate::new(audit),
            exporter: TextEvidenceExporter,
            config,
        }
    }

    /// Validate schema compliance and generate the data quality report,
    /// using the configured baseline dataset for drift comparison.
    pub fn validate(&self, payload: &Value) -> Result<ValidationReport, TdieError> {
        let payload = load_dataset(payload)?;
        let schema_violations =
            SchemaValidator::new(payload.contract.clone()).validate(&payload.records);
        let baseline = self.load_baseline();
        let quality = self.quality.generate_report(&payload.records, &baseline);
        Ok(ValidationReport {
            schema_violations,
            quality,
        })
    }

    /// Run the fairness integrity checks on the submitted dataset.
    pub fn bias(&self, payload: &Value) -> Result<BiasReport, TdieError> {
        let payload = load_dataset(payload)?;
        Ok(self.bias.run_checks(&payload.records))
    }

    /// Run the poisoning-risk heuristics on the submitted dataset.
    pub fn poison(&self, payload: &Value) -> Result<PoisonReport, TdieError> {
        let payload = load_dataset(payload)?;
        Ok(self.poison.compute_risk(&payload.records))
    }

    /// Fingerprint the submitted dataset and flag drift from the most
    /// recently recorded fingerprint. The tamper check runs against the
    /// history tail before the new fingerprint is appended.
    pub fn fingerprint(&self, payload: &Value) -> Result<FingerprintReport, TdieError> {
        let payload = load_dataset(payload)?;
        let metadata: Map<String, Value> = serde_json::from_value(json!({
            "schema_name": payload.contract.name,
            "schema_version": payload.contract.version,
            "record_count": payload.records.len(),
        }))?;

        let tamper_detected = self
            .fingerprint
            .detect_tampering(&hash_dataset(&payload.records));
        let record = self.fingerprint.fingerprint(&payload.records, metadata)?;
        Ok(FingerprintReport {
            record,
            tamper_detected,
        })
    }

    /// Run the full integrity stack and return a consolidated assessment.
    ///
    /// Quality drift compares the batch against itself here; drift against a
    /// stored baseline is the validate operation's concern.
    pub fn evaluate(&self, payload: &Value) -> Result<IntegrityAssessment, TdieError> {
        let payload = load_dataset(payload)?;
        let schema_violations =
            SchemaValidator::new(payload.contract.clone()).validate(&payload.records);
        let quality = self
            .quality
            .generate_report(&payload.records, &payload.records);
        let bias = self.bias.run_checks(&payload.records);
        let poison = self.poison.compute_risk(&payload.records);

        let record_metadata: Map<String, Value> = serde_json::from_value(json!({
            "schema_version": payload.contract.version,
            "schema_name": payload.contract.name,
        }))?;
        let entry = self.provenance.record(
            &payload.source,
            &payload.user,
            payload.transformation_steps.clone(),
            record_metadata,
        )?;
        let completeness_metadata: Map<String, Value> = serde_json::from_value(json!({
            "schema_version": payload.contract.version,
            "schema_name": payload.contract.name,
            "source": payload.source,
            "user": payload.user,
            "transformation_steps": payload.transformation_steps,
        }))?;
        let provenance_completeness = provenance::completeness(&completeness_metadata);

        let result = compute_tdie_score(
            quality.score,
            poison.poisoning_risk_score,
            bias.bias_integrity_score,
            &schema_violations,
            provenance_completeness,
        );
        Ok(IntegrityAssessment {
            quality,
            schema_violations,
            poison,
            bias,
            provenance: entry,
            provenance_completeness,
            result,
        })
    }

    /// Apply the training guardrail to a composite score. A BLOCK outcome is
    /// a normal return value, not an error.
    pub fn gate(
        &self,
        tdie_score: f64,
        level: GuardrailLevel,
        threshold: Option<f64>,
    ) -> GuardrailDecision {
        let threshold = threshold.unwrap_or(self.config.gate.threshold);
        self.gate.decide(tdie_score, level, threshold)
    }

    /// Export an evidence bundle for a guardrail decision and return its
    /// location.
    pub fn export_evidence(
        &self,
        tdie_score: f64,
        decision: &GuardrailDecision,
        path: &Path,
    ) -> Result<PathBuf, TdieError> {
        let report: Map<String, Value> = serde_json::from_value(json!({
            "tdie_score": tdie_score,
            "decision": decision.decision,
            "level": decision.level,
            "reason": decision.reason,
        }))?;
        self.exporter.export(&report, path)
    }

    /// Load the configured baseline dataset for drift comparison. A missing
    /// baseline is an empty batch; an unreadable one is reported and skipped.
    fn load_baseline(&self) -> Vec<Record> {
        let path = &self.config.history.baseline;
        if !path.exists() {
            return Vec::new();
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                tracing::warn!(%error, "failed to read baseline file");
                return Vec::new();
            }
        };
        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!(%error, "failed to parse baseline file");
                Vec::new()
            }
        }
    }
}
