//! Schema registry
//!
//! Loads one JSON Schema per stream. The stream id is the file stem, so
//! `schemas/orders.json` defines the `orders` stream.

use super::types::Schema;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Stream schemas keyed by stream id, in id order
pub type SchemaMap = BTreeMap<String, Schema>;

/// Schemas compiled into the binary
const BUNDLED: &[(&str, &str)] = &[
    ("clients", include_str!("../../schemas/clients.json")),
    ("orders", include_str!("../../schemas/orders.json")),
    ("products", include_str!("../../schemas/products.json")),
];

/// Load every `*.json` schema in a directory
pub fn load_schemas(dir: impl AsRef<Path>) -> Result<SchemaMap> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::load(dir.display().to_string(), e.to_string()))?;

    let mut schemas = SchemaMap::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::load(dir.display().to_string(), e.to_string()))?
            .path();

        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stream_id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::load(path.display().to_string(), e.to_string()))?;
        let schema = parse_schema(&path.display().to_string(), &content)?;

        debug!("Loaded schema for stream '{stream_id}' from {}", path.display());
        schemas.insert(stream_id.to_string(), schema);
    }

    Ok(schemas)
}

/// Schemas shipped with the tap
pub fn bundled_schemas() -> Result<SchemaMap> {
    BUNDLED
        .iter()
        .map(|(id, content)| Ok(((*id).to_string(), parse_schema(id, content)?)))
        .collect()
}

/// Parse one schema document; it must be a JSON object
pub fn parse_schema(source: &str, content: &str) -> Result<Schema> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| Error::load(source, e.to_string()))?;
    if !value.is_object() {
        return Err(Error::load(source, "schema must be a JSON object"));
    }
    serde_json::from_value(value).map_err(|e| Error::load(source, e.to_string()))
}
