//! State types for tracking sync progress
//!
//! State is a flat map of stream id to bookmark, persisted between runs:
//! `{"orders": "2020-08-01T00:00:00Z"}`. The nested
//! `{"bookmarks": {"orders": {"updated_at": "..."}}}` layout is accepted on
//! load and written back flat.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bookmarks of every stream that has synced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "StateDocument",
    into = "BTreeMap<String, String>"
)]
pub struct State {
    bookmarks: BTreeMap<String, String>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark of a stream
    pub fn get_bookmark(&self, stream: &str) -> Option<&str> {
        self.bookmarks.get(stream).map(String::as_str)
    }

    /// Set the bookmark of a stream
    pub fn set_bookmark(&mut self, stream: &str, bookmark: String) {
        self.bookmarks.insert(stream.to_string(), bookmark);
    }

    /// All bookmarks, keyed by stream id
    pub fn bookmarks(&self) -> &BTreeMap<String, String> {
        &self.bookmarks
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// State as a JSON value
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.bookmarks
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

impl From<State> for BTreeMap<String, String> {
    fn from(state: State) -> Self {
        state.bookmarks
    }
}

impl FromIterator<(String, String)> for State {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            bookmarks: iter.into_iter().collect(),
        }
    }
}

/// Accepted on-disk layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum StateDocument {
    Nested {
        bookmarks: BTreeMap<String, BTreeMap<String, String>>,
    },
    Flat(BTreeMap<String, Option<String>>),
}

impl TryFrom<StateDocument> for State {
    type Error = String;

    fn try_from(document: StateDocument) -> Result<Self, Self::Error> {
        match document {
            StateDocument::Flat(map) => Ok(map
                .into_iter()
                .filter_map(|(stream, value)| value.map(|v| (stream, v)))
                .collect()),
            StateDocument::Nested { bookmarks } => bookmarks
                .into_iter()
                .filter(|(_, keys)| !keys.is_empty())
                .map(|(stream, keys)| {
                    if keys.len() > 1 {
                        return Err(format!("stream '{stream}' has more than one bookmark"));
                    }
                    let value = keys.into_values().next().unwrap_or_default();
                    Ok((stream, value))
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.is_empty());
        assert!(state.get_bookmark("orders").is_none());
    }

    #[test]
    fn test_state_bookmark() {
        let mut state = State::new();
        state.set_bookmark("orders", "2020-08-01T00:00:00Z".to_string());
        assert_eq!(state.get_bookmark("orders"), Some("2020-08-01T00:00:00Z"));
        assert!(!state.is_empty());
    }

    #[test]
    fn test_state_serializes_flat() {
        let mut state = State::new();
        state.set_bookmark("products", "2020-08-02T00:00:00Z".to_string());
        state.set_bookmark("clients", "2020-08-01T00:00:00Z".to_string());

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            json!({
                "clients": "2020-08-01T00:00:00Z",
                "products": "2020-08-02T00:00:00Z"
            })
        );
        assert_eq!(state.to_value(), value);

        let restored: State = serde_json::from_value(value).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_state_nested_layout() {
        let state: State = serde_json::from_value(json!({
            "bookmarks": {
                "orders": {"updated_at": "2020-08-01T00:00:00Z"},
                "clients": {}
            }
        }))
        .unwrap();

        assert_eq!(state.get_bookmark("orders"), Some("2020-08-01T00:00:00Z"));
        assert!(state.get_bookmark("clients").is_none());
    }

    #[test]
    fn test_state_nested_ambiguous() {
        let result: Result<State, _> = serde_json::from_value(json!({
            "bookmarks": {"orders": {"updated_at": "a", "created_at": "b"}}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_state_flat_null_ignored() {
        let state: State =
            serde_json::from_value(json!({"orders": null, "clients": "2020-08-01T00:00:00Z"}))
                .unwrap();
        assert!(state.get_bookmark("orders").is_none());
        assert_eq!(state.bookmarks().len(), 1);
    }

    #[test]
    fn test_state_rejects_non_string_bookmark() {
        let result: Result<State, _> = serde_json::from_value(json!({"orders": 5}));
        assert!(result.is_err());
    }
}
