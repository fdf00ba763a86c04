//! Error types for the tdie-core crate.

use thiserror::Error;

/// Top-level error type for integrity pipeline operations.
///
/// Validation findings (schema violations, quality issues, poison signals)
/// are never errors; they are returned as report data. Only structurally
/// invalid input and persistence failures surface here.
#[derive(Debug, Error)]
pub enum TdieError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TdieError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
