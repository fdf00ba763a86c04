//! End-to-end tests driving the pipeline through its public surface.

use serde_json::{Value, json};
use tdie_core::engines::gate::GuardrailLevel;
use tdie_core::engines::scoring::Decision;
use tdie_core::{IntegrityPipeline, TdieConfig, TdieError};
use tempfile::TempDir;

fn pipeline_in(dir: &TempDir) -> IntegrityPipeline {
    let mut config = TdieConfig::default();
    config.history.provenance_log = dir.path().join("provenance/provenance_log.json");
    config.history.checksum_history = dir.path().join("provenance/checksum_history.json");
    config.history.audit_log = dir.path().join("logs/training_audit.json");
    config.history.baseline = dir.path().join("data/baseline.json");
    IntegrityPipeline::new(config)
}

fn example_payload() -> Value {
    json!({
        "schema": {
            "name": "synthetic_demo",
            "version": "1.0",
            "fields": [
                {"name": "id", "dtype": "int", "required": true},
                {"name": "value", "dtype": "float", "required": true,
                 "min_value": 0, "max_value": 50},
                {"name": "group", "dtype": "str", "required": true},
                {"name": "label", "dtype": "int", "required": true},
                {"name": "timestamp", "dtype": "datetime", "required": true}
            ]
        },
        "records": [
            {"id": 1, "value": 10.5, "group": "A", "label": 1,
             "timestamp": "2024-01-01T00:00:00"},
            {"id": 2, "value": 9.7, "group": "B", "label": 0,
             "timestamp": "2024-01-02T00:00:00"},
            {"id": 3, "value": 11.2, "group": "A", "label": 1,
             "timestamp": "2024-01-03T00:00:00"}
        ],
        "source": "synthetic",
        "user": "tester",
        "transformation_steps": ["scaling"]
    })
}

#[test]
fn end_to_end_assessment_matches_composite_arithmetic() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir);
    let assessment = pipeline.evaluate(&example_payload()).unwrap();

    // Contract is fully satisfied.
    assert!(assessment.schema_violations.is_empty());
    // Group A rate 1.0, group B rate 0.0.
    assert_eq!(assessment.bias.demographic_parity_gap, 1.0);
    assert!(assessment.quality.score > 0.0);
    assert_eq!(assessment.provenance_completeness, 100.0);

    // tdie_score reflects (quality + bias + provenance) / 3 - poison with a
    // zero schema penalty.
    let base = (assessment.quality.score
        + assessment.bias.bias_integrity_score
        + assessment.provenance_completeness)
        / 3.0;
    let expected = (base - assessment.poison.poisoning_risk_score).clamp(0.0, 100.0);
    assert!((assessment.result.tdie_score - (expected * 100.0).round() / 100.0).abs() < 1e-9);
}

#[test]
fn every_score_stays_in_range() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir);

    let payloads = [
        example_payload(),
        // Heavily poisoned and incomplete batch.
        json!({
            "schema": {
                "name": "dirty",
                "version": "0.1",
                "fields": [
                    {"name": "id", "dtype": "int", "required": true},
                    {"name": "label", "dtype": "int", "required": true}
                ],
                "expected_records": 50
            },
            "records": [
                {"id": "one", "label": "flipped_0", "group": "rare_group", "note": "trigger_a"},
                {"id": null, "label": "flipped_1"},
                {"id": 3},
                {"id": 3},
                {"id": 9999999}
            ]
        }),
    ];

    for payload in &payloads {
        let assessment = pipeline.evaluate(payload).unwrap();
        for score in [
            assessment.quality.score,
            assessment.bias.bias_integrity_score,
            assessment.poison.poisoning_risk_score,
            assessment.provenance_completeness,
            assessment.result.tdie_score,
        ] {
            assert!((0.0..=100.0).contains(&score), "score out of range: {score}");
        }
    }
}

#[test]
fn repeated_evaluation_is_deterministic_apart_from_history() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir);
    let first = pipeline.evaluate(&example_payload()).unwrap();
    let second = pipeline.evaluate(&example_payload()).unwrap();

    assert_eq!(first.result.tdie_score, second.result.tdie_score);
    assert_eq!(
        first.poison.suspected_poison_samples,
        second.poison.suspected_poison_samples
    );
    assert_eq!(first.bias, second.bias);
}

#[test]
fn fingerprint_round_trip_and_tamper_flag() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir);

    let first = pipeline.fingerprint(&example_payload()).unwrap();
    assert!(!first.tamper_detected);
    assert_eq!(first.record.feature_hashes.len(), 5);

    let mut altered = example_payload();
    altered["records"][1]["value"] = json!(999.9);
    let second = pipeline.fingerprint(&altered).unwrap();
    assert!(second.tamper_detected);
    assert_ne!(second.record.dataset_hash, first.record.dataset_hash);
    // Only the mutated column hash moves.
    assert_ne!(
        second.record.feature_hashes["value"],
        first.record.feature_hashes["value"]
    );
    assert_eq!(
        second.record.feature_hashes["id"],
        first.record.feature_hashes["id"]
    );
}

#[test]
fn guardrail_matrix_and_audit_trail() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir);

    assert_eq!(
        pipeline
            .gate(50.0, GuardrailLevel::Strict, Some(60.0))
            .decision,
        Decision::Block
    );
    assert_eq!(
        pipeline
            .gate(50.0, GuardrailLevel::Moderate, Some(60.0))
            .decision,
        Decision::Review
    );
    assert_eq!(
        pipeline
            .gate(10.0, GuardrailLevel::Permissive, None)
            .decision,
        Decision::Pass
    );

    let audit = std::fs::read_to_string(dir.path().join("logs/training_audit.json")).unwrap();
    let entries: Vec<Value> = serde_json::from_str(&audit).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["decision"], "BLOCK");
    assert_eq!(entries[2]["level"], "PERMISSIVE");
}

#[test]
fn structurally_invalid_payloads_are_input_errors() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir);

    let mut empty = example_payload();
    empty["records"] = json!([]);
    assert!(matches!(
        pipeline.validate(&empty),
        Err(TdieError::Input(_))
    ));

    let mut scalar_record = example_payload();
    scalar_record["records"] = json!(["not-an-object"]);
    assert!(matches!(
        pipeline.poison(&scalar_record),
        Err(TdieError::Input(_))
    ));

    assert!(matches!(
        pipeline.bias(&json!({"records": [{"id": 1}]})),
        Err(TdieError::Input(_))
    ));
}

#[test]
fn schema_findings_never_abort_scoring() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_in(&dir);
    // Every record violates the contract; the pipeline still scores.
    let payload = json!({
        "schema": {
            "name": "strict",
            "version": "1.0",
            "fields": [
                {"name": "id", "dtype": "int", "required": true},
                {"name": "group", "dtype": "str", "required": true,
                 "allowed_values": ["A", "B"]}
            ]
        },
        "records": [
            {"group": "Z"},
            {"id": "seven", "group": 4}
        ]
    });
    let assessment = pipeline.evaluate(&payload).unwrap();
    assert_eq!(assessment.schema_violations.len(), 5);
    // Five ERROR violations cost 150 points; the floor and the block band
    // both engage.
    assert_eq!(assessment.result.tdie_score, 0.0);
    assert_eq!(assessment.result.decision, Decision::Block);
}
