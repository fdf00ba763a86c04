//! Declared field contract for submitted datasets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a contract field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Int,
    Float,
    Str,
    Bool,
    #[serde(rename = "datetime")]
    DateTime,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// Contract for a single field. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub dtype: FieldType,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

fn default_required() -> bool {
    true
}

/// Shape every record of a dataset must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetContract {
    pub name: String,
    pub version: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_records: Option<usize>,
}
