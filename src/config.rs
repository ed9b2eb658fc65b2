//! Configuration types
//!
//! Two inputs configure a run:
//! - `TapConfig`, the JSON config file (API location, token, start date)
//! - `StreamTable`, the per-stream definitions (endpoint, replication settings)

use crate::bookmark::{parse_bookmark, BookmarkStrategy};
use crate::error::{Error, Result};
use crate::types::{ReplicationMethod, StringMap};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Keys every config file must provide
pub const REQUIRED_CONFIG_KEYS: &[&str] = &["start_date", "api_token", "api_url"];

/// Stream definitions shipped with the tap
const BUNDLED_STREAMS: &str = include_str!("../streams.yaml");

// ============================================================================
// Tap Config
// ============================================================================

/// Run configuration loaded from the JSON config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Bookmark used for streams without state (`YYYY-MM-DDTHH:MM:SSZ`)
    pub start_date: String,

    /// API token sent with every request
    pub api_token: String,

    /// Base URL of the API (without version segment)
    pub api_url: String,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound on pages fetched per stream
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Client-side rate limit
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// Transport retries for transient failures (0 = never retry)
    #[serde(default)]
    pub max_retries: u32,
}

fn default_timeout() -> u64 {
    30
}

impl TapConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a config document
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;

        for key in REQUIRED_CONFIG_KEYS {
            match value.get(key) {
                Some(v) if !v.is_null() => {}
                _ => return Err(Error::missing_field(*key)),
            }
        }

        let config: TapConfig = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialization cannot
    pub fn validate(&self) -> Result<()> {
        parse_bookmark(&self.start_date)
            .map_err(|e| Error::invalid_value("start_date", e.to_string()))?;

        if self.api_token.trim().is_empty() {
            return Err(Error::invalid_value("api_token", "must not be empty"));
        }

        url::Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;

        if self.max_pages == Some(0) {
            return Err(Error::invalid_value("max_pages", "must be at least 1"));
        }

        Ok(())
    }
}

// ============================================================================
// Stream Definitions
// ============================================================================

/// Static definition of one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDefinition {
    /// Stream id; matches the schema file stem
    pub id: String,

    /// Endpoint name appended to `<api_url>/v2/`
    pub endpoint: String,

    /// Whether the stream is synced by default
    #[serde(default = "default_true")]
    pub selected: bool,

    /// Replication method
    #[serde(default)]
    pub replication_method: ReplicationMethod,

    /// Field used for bookmarking
    #[serde(default)]
    pub replication_key: Option<String>,

    /// Bookmark advancement strategy
    #[serde(default)]
    pub bookmark_strategy: BookmarkStrategy,

    /// Base query parameters sent with every page request
    #[serde(default)]
    pub params: StringMap,

    /// Key of a top-level object payload that ends pagination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_marker: Option<String>,
}

fn default_true() -> bool {
    true
}

impl StreamDefinition {
    /// Create an incremental stream definition
    pub fn incremental(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        replication_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            selected: true,
            replication_method: ReplicationMethod::Incremental,
            replication_key: Some(replication_key.into()),
            bookmark_strategy: BookmarkStrategy::Accumulating,
            params: StringMap::new(),
            end_marker: None,
        }
    }

    /// Create a full-table stream definition
    pub fn full_table(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            selected: true,
            replication_method: ReplicationMethod::FullTable,
            replication_key: None,
            bookmark_strategy: BookmarkStrategy::Accumulating,
            params: StringMap::new(),
            end_marker: None,
        }
    }

    /// Set selection
    #[must_use]
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Set bookmark strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: BookmarkStrategy) -> Self {
        self.bookmark_strategy = strategy;
        self
    }

    /// End pagination on an object payload carrying this key
    #[must_use]
    pub fn with_end_marker(mut self, key: impl Into<String>) -> Self {
        self.end_marker = Some(key.into());
        self
    }

    /// Add a base query parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::config("Stream definition with empty id"));
        }
        if self.endpoint.is_empty() {
            return Err(Error::config(format!(
                "Stream '{}' has an empty endpoint",
                self.id
            )));
        }
        if self.replication_method == ReplicationMethod::Incremental
            && self.replication_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::config(format!(
                "Stream '{}' is INCREMENTAL but has no replication_key",
                self.id
            )));
        }
        Ok(())
    }
}

/// The table of known streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamTable {
    /// Stream definitions, in declaration order
    pub streams: Vec<StreamDefinition>,
}

impl StreamTable {
    /// Build a table from definitions, validating each one
    pub fn new(streams: Vec<StreamDefinition>) -> Result<Self> {
        let table = Self { streams };
        table.validate()?;
        Ok(table)
    }

    /// The definitions shipped with the tap
    pub fn bundled() -> Result<Self> {
        Self::from_yaml(BUNDLED_STREAMS)
    }

    /// Load definitions from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read stream definitions {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse definitions from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let table: StreamTable = serde_yaml::from_str(yaml)?;
        table.validate()?;
        Ok(table)
    }

    /// Look up a stream definition
    pub fn get(&self, id: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.id == id)
    }

    /// Look up a stream definition, failing if it is unknown
    pub fn require(&self, id: &str) -> Result<&StreamDefinition> {
        self.get(id).ok_or_else(|| Error::UnknownStream {
            stream: id.to_string(),
        })
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for stream in &self.streams {
            stream.validate()?;
            if !seen.insert(stream.id.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate stream definition '{}'",
                    stream.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_json() -> serde_json::Value {
        json!({
            "start_date": "2020-08-01T00:00:00Z",
            "api_token": "secret",
            "api_url": "https://api.example.com"
        })
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = TapConfig::from_json(&config_json().to_string()).unwrap();
        assert_eq!(config.start_date, "2020-08-01T00:00:00Z");
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_retries, 0);
        assert!(config.max_pages.is_none());
    }

    #[test]
    fn test_missing_required_key() {
        for key in REQUIRED_CONFIG_KEYS {
            let mut value = config_json();
            value.as_object_mut().unwrap().remove(*key);

            let err = TapConfig::from_json(&value.to_string()).unwrap_err();
            assert!(
                matches!(&err, Error::MissingConfigField { field } if field == key),
                "unexpected error for {key}: {err}"
            );
        }
    }

    #[test]
    fn test_invalid_start_date() {
        let mut value = config_json();
        value["start_date"] = json!("2020-08-01");

        let err = TapConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "start_date"));
    }

    #[test]
    fn test_invalid_api_url() {
        let mut value = config_json();
        value["api_url"] = json!("not a url");

        let err = TapConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        let mut value = config_json();
        value["max_pages"] = json!(0);
        assert!(TapConfig::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, config_json().to_string()).unwrap();

        let config = TapConfig::from_file(&path).unwrap();
        assert_eq!(config.api_token, "secret");

        assert!(TapConfig::from_file(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_bundled_streams() {
        let table = StreamTable::bundled().unwrap();
        let ids: Vec<_> = table.streams.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["orders", "products", "clients"]);

        let orders = table.get("orders").unwrap();
        assert!(!orders.selected);
        assert_eq!(orders.replication_method, ReplicationMethod::Incremental);
        assert_eq!(orders.replication_key.as_deref(), Some("updated_at"));
        assert_eq!(orders.params.get("start"), Some(&"20200801".to_string()));
        assert_eq!(orders.params.get("finish"), Some(&"20200801".to_string()));
        assert_eq!(orders.end_marker.as_deref(), Some("msg"));

        let products = table.get("products").unwrap();
        assert!(products.selected);
        assert!(products.params.is_empty());
        assert!(products.end_marker.is_none());
        assert_eq!(products.bookmark_strategy, BookmarkStrategy::Accumulating);
    }

    #[test]
    fn test_stream_definition_defaults() {
        let yaml = r"
streams:
  - id: invoices
    endpoint: invoices
    replication_key: updated_at
";
        let table = StreamTable::from_yaml(yaml).unwrap();
        let invoices = table.require("invoices").unwrap();
        assert!(invoices.selected);
        assert_eq!(invoices.replication_method, ReplicationMethod::Incremental);
        assert_eq!(invoices.bookmark_strategy, BookmarkStrategy::Accumulating);
        assert!(invoices.end_marker.is_none());
    }

    #[test]
    fn test_incremental_requires_replication_key() {
        let yaml = r"
streams:
  - id: invoices
    endpoint: invoices
    replication_method: INCREMENTAL
";
        let err = StreamTable::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("no replication_key"));
    }

    #[test]
    fn test_full_table_without_key() {
        let table = StreamTable::new(vec![StreamDefinition::full_table("stock", "stock")]).unwrap();
        assert!(table.require("stock").unwrap().replication_key.is_none());
    }

    #[test]
    fn test_duplicate_stream_ids() {
        let err = StreamTable::new(vec![
            StreamDefinition::incremental("orders", "orders", "updated_at"),
            StreamDefinition::incremental("orders", "pedidos", "updated_at"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_require_unknown_stream() {
        let table = StreamTable::bundled().unwrap();
        assert!(matches!(
            table.require("invoices"),
            Err(Error::UnknownStream { .. })
        ));
    }
}
