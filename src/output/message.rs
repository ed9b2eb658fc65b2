//! Messages emitted by a sync

use crate::schema::Schema;
use crate::state::State;
use crate::types::{JsonObject, JsonValue, LogLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One line of tap output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// Describes the records of a stream that follow
    Schema {
        stream: String,
        schema: JsonValue,
        key_properties: Vec<String>,
        bookmark_properties: Vec<String>,
    },
    /// One transformed record
    Record {
        stream: String,
        record: JsonObject,
        time_extracted: String,
    },
    /// Bookmarks committed so far
    State { value: JsonValue },
    /// Progress report; never written to the data channel
    Log { level: LogLevel, message: String },
}

impl Message {
    /// Create a SCHEMA message
    pub fn schema(
        stream: impl Into<String>,
        schema: &Schema,
        key_properties: Vec<String>,
        bookmark_key: Option<&str>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema: schema.to_json(),
            key_properties,
            bookmark_properties: bookmark_key.map(ToString::to_string).into_iter().collect(),
        }
    }

    /// Create a RECORD message
    pub fn record(
        stream: impl Into<String>,
        record: JsonObject,
        time_extracted: DateTime<Utc>,
    ) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: time_extracted.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        }
    }

    /// Create a STATE message
    pub fn state(state: &State) -> Self {
        Self::State {
            value: state.to_value(),
        }
    }

    /// Create a LOG message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }

    /// Stream the message belongs to, if any
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } | Self::Log { .. } => None,
        }
    }
}
