//! Schema validation and contract enforcement.

use crate::dataset::contract::{DatasetContract, FieldSpec, FieldType};
use crate::dataset::value::{Record, coerce_f64, parse_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How strongly a violation counts against the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warn,
    Info,
}

/// A single contract violation. Findings are data, never errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl Violation {
    fn error(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
            severity: Severity::Error,
        }
    }

    fn warn(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
            severity: Severity::Warn,
        }
    }
}

/// Validator ensuring records comply with a declared contract.
///
/// Malformed records never abort validation; every anomaly becomes a
/// [`Violation`]. The contract and records are never mutated.
pub struct SchemaValidator {
    contract: DatasetContract,
}

impl SchemaValidator {
    pub fn new(contract: DatasetContract) -> Self {
        Self { contract }
    }

    /// Check each record against the contract and report all violations.
    pub fn validate(&self, records: &[Record]) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            for field in &self.contract.fields {
                let Some(value) = record.get(&field.name) else {
                    if field.required {
                        violations.push(Violation::error(
                            &field.name,
                            format!("Record {idx} missing required field"),
                        ));
                    }
                    continue;
                };
                self.check_value(idx, field, value, &mut violations);
            }
        }
        if let Some(expected) = self.contract.expected_records
            && records.len() != expected
        {
            violations.push(Violation::warn(
                "dataset",
                "Record count deviates from expected".to_string(),
            ));
        }
        tracing::info!(count = violations.len(), "schema validation finished");
        violations
    }

    fn check_value(
        &self,
        idx: usize,
        field: &FieldSpec,
        value: &Value,
        violations: &mut Vec<Violation>,
    ) {
        if !matches_type(value, field.dtype) {
            violations.push(Violation::error(
                &field.name,
                format!("Record {idx} type mismatch expected {}", field.dtype),
            ));
        }
        if let Some(allowed) = &field.allowed_values
            && !allowed.is_empty()
            && !allowed.contains(value)
        {
            violations.push(Violation::error(
                &field.name,
                format!("Record {idx} value {value} not in allowed set"),
            ));
        }
        if let Some(min) = field.min_value
            && coerce_f64(value) < min
        {
            violations.push(Violation::warn(
                &field.name,
                format!("Record {idx} below min {min}"),
            ));
        }
        if let Some(max) = field.max_value
            && coerce_f64(value) > max
        {
            violations.push(Violation::warn(
                &field.name,
                format!("Record {idx} above max {max}"),
            ));
        }
    }
}

/// Whether a value conforms to the declared dtype. Booleans never satisfy
/// the numeric dtypes.
fn matches_type(value: &Value, dtype: FieldType) -> bool {
    match dtype {
        FieldType::Int => matches!(value, Value::Number(n) if !n.is_f64()),
        FieldType::Float => matches!(value, Value::Number(_)),
        FieldType::Str => value.is_string(),
        FieldType::Bool => value.is_boolean(),
        FieldType::DateTime => match value {
            Value::String(s) => parse_timestamp(s).is_some(),
            _ => false,
        },
    }
}
