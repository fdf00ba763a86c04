//! Dataset contract, record values, and payload loading.

pub mod contract;
pub mod loader;
pub mod value;

pub use contract::{DatasetContract, FieldSpec, FieldType};
pub use loader::{DatasetPayload, load_dataset};
pub use value::{Record, ValueKind};
