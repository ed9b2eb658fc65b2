//! Schema registry module
//!
//! Per-stream JSON Schemas, loaded from a directory or from the set
//! bundled with the tap.

mod registry;
mod types;

pub use registry::{bundled_schemas, load_schemas, parse_schema, SchemaMap};
pub use types::{JsonType, JsonTypeOrArray, Schema};
