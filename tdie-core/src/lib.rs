//! # tdie-core — Training Data Integrity Engine
//!
//! Scores the integrity of a training dataset and gates whether a training
//! job may proceed. Given a declared field contract and an in-memory batch
//! of records, the engines compute quality, fairness, poisoning-risk,
//! provenance-completeness, and fingerprint/tamper signals; the scorer folds
//! them into one composite TDIE score and the guardrail maps that score to a
//! PASS/REVIEW/BLOCK decision.
//!
//! The pipeline is synchronous and single-pass: every engine is a pure
//! function of its inputs (stochastic steps run from fixed seeds), and the
//! only side effects are appends to the provenance, checksum, and audit
//! histories behind the [`history::HistoryStore`] capability. Findings are
//! data: a dataset full of violations still scores. Only structurally
//! invalid input returns an error.

// Foundation
pub mod config;
pub mod error;

// Data model & ingestion
pub mod dataset;

// Numeric primitives
pub mod cluster;
pub mod hash;
pub mod stats;

// Integrity engines
pub mod engines;

// Collaborator capabilities
pub mod evidence;
pub mod history;

// Orchestration
pub mod pipeline;

// Re-exports
pub use config::TdieConfig;
pub use error::TdieError;
pub use pipeline::{IntegrityAssessment, IntegrityPipeline};
