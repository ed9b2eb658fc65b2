//! Engine types
//!
//! Configuration and statistics for the sync engine.

use crate::catalog::CatalogEntry;
use crate::config::StreamDefinition;
use chrono::{DateTime, Utc};

/// Configuration for sync operation
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bookmark used for streams without state (`YYYY-MM-DDTHH:MM:SSZ`)
    pub start_date: String,
    /// Abort the run on the first stream failure
    pub fail_fast: bool,
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new(start_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            fail_fast: false,
        }
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Streams that completed
    pub streams_synced: usize,
    /// Streams that failed, in sync order
    pub failed_streams: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Add a record
    pub fn add_record(&mut self) {
        self.records_synced += 1;
    }

    /// Add pages
    pub fn add_pages(&mut self, count: u32) {
        self.pages_fetched += count as usize;
    }

    /// Add a completed stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add a failed stream
    pub fn add_failure(&mut self, stream: impl Into<String>) {
        self.failed_streams.push(stream.into());
    }

    /// Number of failed streams
    pub fn streams_failed(&self) -> usize {
        self.failed_streams.len()
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// A selected stream, ready to sync
#[derive(Debug, Clone)]
pub(crate) struct PlannedStream {
    pub entry: CatalogEntry,
    pub definition: StreamDefinition,
    /// Replication key, when the stream is bookmarked
    pub bookmark_key: Option<String>,
    /// Starting bookmark, when the stream is bookmarked
    pub resolved: Option<DateTime<Utc>>,
}

impl PlannedStream {
    pub fn id(&self) -> &str {
        &self.entry.tap_stream_id
    }
}
