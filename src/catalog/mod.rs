//! Catalog module
//!
//! Discovery joins the schema registry with the stream definition table.
//! Every schema must have a definition; a schema without one is a
//! configuration error, never silently skipped.

mod types;

pub use types::{Catalog, CatalogEntry, MetadataEntry, StreamMetadata};

use crate::config::StreamTable;
use crate::error::{Error, Result};
use crate::schema::SchemaMap;
use tracing::debug;

/// Build the catalog for every stream in the schema registry
pub fn discover(schemas: &SchemaMap, definitions: &StreamTable) -> Result<Catalog> {
    let mut streams = Vec::with_capacity(schemas.len());

    for (stream_id, schema) in schemas {
        let definition = definitions.get(stream_id).ok_or_else(|| {
            Error::config(format!(
                "Schema '{stream_id}' has no stream definition"
            ))
        })?;

        debug!(
            "Discovered stream '{stream_id}' ({}, selected: {})",
            definition.replication_method, definition.selected
        );

        streams.push(CatalogEntry {
            tap_stream_id: stream_id.clone(),
            stream: stream_id.clone(),
            schema: schema.clone(),
            key_properties: Vec::new(),
            replication_method: definition.replication_method,
            replication_key: definition.replication_key.clone(),
            metadata: vec![MetadataEntry {
                breadcrumb: Vec::new(),
                metadata: StreamMetadata {
                    selected: definition.selected,
                    replication_method: Some(definition.replication_method),
                    replication_key: definition.replication_key.clone(),
                },
            }],
        });
    }

    Catalog::new(streams)
}
