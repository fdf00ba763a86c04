//! Dataset payload loading and structural validation.

use crate::dataset::contract::DatasetContract;
use crate::dataset::value::Record;
use crate::error::TdieError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Expected payload for dataset submission.
#[derive(Debug, Clone)]
pub struct DatasetPayload {
    pub contract: DatasetContract,
    pub records: Vec<Record>,
    pub source: String,
    pub user: String,
    pub transformation_steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(alias = "contract")]
    schema: DatasetContract,
    records: Vec<Value>,
    #[serde(default = "default_source")]
    source: String,
    #[serde(default = "default_user")]
    user: String,
    #[serde(default)]
    transformation_steps: Vec<String>,
}

fn default_source() -> String {
    "synthetic".to_string()
}

fn default_user() -> String {
    "system".to_string()
}

/// Validate an incoming payload and return contract plus records.
///
/// Structural problems (malformed payload, duplicate contract fields, an
/// empty record set, non-object record entries) are surfaced immediately as
/// [`TdieError::Input`]; no partial computation is attempted downstream.
pub fn load_dataset(payload: &Value) -> Result<DatasetPayload, TdieError> {
    let raw: RawPayload = serde_json::from_value(payload.clone())
        .map_err(|e| TdieError::input(format!("Dataset payload validation failed: {e}")))?;

    let mut seen = HashSet::new();
    for field in &raw.schema.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(TdieError::input(format!(
                "Duplicate field {} in contract",
                field.name
            )));
        }
    }

    if raw.records.is_empty() {
        return Err(TdieError::input("No records supplied"));
    }
    let records = raw
        .records
        .into_iter()
        .map(|entry| match entry {
            Value::Object(map) => Ok(map),
            _ => Err(TdieError::input("Records must be objects")),
        })
        .collect::<Result<Vec<Record>, _>>()?;

    tracing::info!(count = records.len(), "dataset payload received");
    Ok(DatasetPayload {
        contract: raw.schema,
        records,
        source: raw.source,
        user: raw.user,
        transformation_steps: raw.transformation_steps,
    })
}
