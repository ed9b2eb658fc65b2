//! Catalog types
//!
//! The serialized shape is the catalog document printed by discovery mode
//! and accepted back by sync mode.

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::ReplicationMethod;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Metadata values attached to a breadcrumb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMetadata {
    /// Whether the stream is synced
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub selected: bool,

    /// Replication method
    #[serde(rename = "replication-method", default)]
    pub replication_method: Option<ReplicationMethod>,

    /// Replication key
    #[serde(
        rename = "replication-key",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub replication_key: Option<String>,
}

/// One metadata entry; an empty breadcrumb addresses the stream itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Path to the schema node this entry describes
    #[serde(default)]
    pub breadcrumb: Vec<String>,

    /// Metadata values
    pub metadata: StreamMetadata,
}

/// One stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique stream id
    pub tap_stream_id: String,

    /// Stream name
    pub stream: String,

    /// Record schema
    pub schema: Schema,

    /// Primary key fields (always empty for this tap)
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Replication method
    #[serde(default)]
    pub replication_method: ReplicationMethod,

    /// Field used for bookmarking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Stream metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl CatalogEntry {
    /// Stream-level metadata (empty breadcrumb)
    pub fn stream_metadata(&self) -> Option<&StreamMetadata> {
        self.metadata
            .iter()
            .find(|entry| entry.breadcrumb.is_empty())
            .map(|entry| &entry.metadata)
    }

    /// Whether this stream is selected for sync
    pub fn is_selected(&self) -> bool {
        self.stream_metadata().is_some_and(|m| m.selected)
    }

    /// Effective replication method; stream-level metadata wins
    pub fn replication_method(&self) -> ReplicationMethod {
        self.stream_metadata()
            .and_then(|m| m.replication_method)
            .unwrap_or(self.replication_method)
    }

    /// Effective replication key; stream-level metadata wins
    pub fn replication_key(&self) -> Option<&str> {
        self.stream_metadata()
            .and_then(|m| m.replication_key.as_deref())
            .or(self.replication_key.as_deref())
    }

    /// Replication key to bookmark on, if this stream bookmarks at all
    pub fn bookmark_key(&self) -> Option<&str> {
        match self.replication_method() {
            ReplicationMethod::Incremental => self.replication_key(),
            ReplicationMethod::FullTable => None,
        }
    }
}

/// The set of streams a run considers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Streams, in discovery order
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate stream ids and selected
    /// incremental streams without a replication key
    pub fn new(streams: Vec<CatalogEntry>) -> Result<Self> {
        let catalog = Self { streams };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Parse a catalog document
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid catalog: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Render the catalog document
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a stream
    pub fn get(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|s| s.tap_stream_id == tap_stream_id)
    }

    /// Selected streams, in catalog order
    pub fn selected_streams(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.streams.iter().filter(|s| s.is_selected())
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for stream in &self.streams {
            if !seen.insert(stream.tap_stream_id.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate catalog stream '{}'",
                    stream.tap_stream_id
                )));
            }
            if stream.is_selected()
                && stream.replication_method() == ReplicationMethod::Incremental
                && stream.replication_key().map_or(true, str::is_empty)
            {
                return Err(Error::config(format!(
                    "Catalog stream '{}' is INCREMENTAL but has no replication key",
                    stream.tap_stream_id
                )));
            }
        }
        Ok(())
    }
}

/// Accept `true`/`false` as booleans or as strings
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got '{other}'"
            ))),
        },
    }
}
