//! The integrity check engines.
//!
//! Each engine is an independent, single-pass computation over an in-memory
//! batch of records; none depends on another's internals. The scorer
//! combines their scalar outputs and the gate maps the composite score to a
//! training decision.

pub mod bias;
pub mod fingerprint;
pub mod gate;
pub mod poison;
pub mod provenance;
pub mod quality;
pub mod schema;
pub mod scoring;
