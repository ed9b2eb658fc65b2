//! Execution engine module
//!
//! Runs the selected streams of a catalog one after another.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Orchestrates fetch, transform, emission and bookmarks
//! - `SyncConfig` - Configuration for sync operations
//! - `SyncStats` - Counters for a run
//!
//! Every selected stream's starting bookmark is resolved before the first
//! request is made, so a malformed bookmark aborts the run without partial
//! output. After that, fetch and validation errors only fail the stream they
//! happen in.

mod types;

pub use types::{SyncConfig, SyncStats};

use crate::bookmark::{format_bookmark, parse_bookmark, parse_record_timestamp, BookmarkTracker};
use crate::catalog::Catalog;
use crate::config::StreamTable;
use crate::error::{Error, Result};
use crate::fetch::RecordSource;
use crate::output::{Message, MessageSink};
use crate::state::StateManager;
use crate::transform::Transformer;
use crate::types::{JsonObject, LogLevel, ReplicationMethod};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Instant;
use types::PlannedStream;

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<S> {
    /// Where records come from
    source: S,
    /// State manager
    state: StateManager,
    /// Stream definitions
    streams: StreamTable,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl<S: RecordSource> SyncEngine<S> {
    /// Create a new sync engine
    pub fn new(source: S, state: StateManager, streams: StreamTable, config: SyncConfig) -> Self {
        Self {
            source,
            state,
            streams,
            config,
            stats: SyncStats::default(),
        }
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync every selected stream of the catalog.
    ///
    /// Returns `Error::PartialSync` when at least one stream failed; the
    /// statistics are still available through [`SyncEngine::stats`].
    pub async fn sync(
        &mut self,
        catalog: &Catalog,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        self.stats = SyncStats::default();

        let plan = self.plan(catalog).await?;
        if plan.is_empty() {
            log(sink, LogLevel::Warn, "No streams selected")?;
        }

        for stream in &plan {
            match self.sync_stream(stream, sink).await {
                Ok(()) => self.stats.add_stream(),
                Err(e) if e.is_stream_scoped() && !self.config.fail_fast => {
                    log(
                        sink,
                        LogLevel::Error,
                        format!("Stream '{}' failed: {e}", stream.id()),
                    )?;
                    self.stats.add_failure(stream.id());
                }
                Err(e) => return Err(e),
            }
        }

        sink.send(Message::state(&self.state.snapshot().await))?;
        sink.flush()?;

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        log(
            sink,
            LogLevel::Info,
            format!(
                "Sync finished: {} records, {} pages, {} streams synced, {} failed in {}ms",
                self.stats.records_synced,
                self.stats.pages_fetched,
                self.stats.streams_synced,
                self.stats.streams_failed(),
                self.stats.duration_ms
            ),
        )?;

        if self.stats.failed_streams.is_empty() {
            Ok(self.stats.clone())
        } else {
            Err(Error::PartialSync {
                failed: self.stats.failed_streams.clone(),
            })
        }
    }

    /// Resolve definitions and starting bookmarks of the selected streams
    async fn plan(&self, catalog: &Catalog) -> Result<Vec<PlannedStream>> {
        let mut plan = Vec::new();

        for entry in catalog.selected_streams() {
            let definition = self.streams.require(&entry.tap_stream_id)?.clone();
            let bookmark_key = entry.bookmark_key().map(ToString::to_string);

            let resolved = match &bookmark_key {
                Some(_) => Some(self.resolve_bookmark(&entry.tap_stream_id).await?),
                None => None,
            };

            plan.push(PlannedStream {
                entry: entry.clone(),
                definition,
                bookmark_key,
                resolved,
            });
        }

        Ok(plan)
    }

    async fn resolve_bookmark(&self, stream: &str) -> Result<DateTime<Utc>> {
        match self.state.get_bookmark(stream).await {
            Some(value) => parse_bookmark(&value).map_err(|_| {
                Error::invalid_value(
                    format!("state.{stream}"),
                    format!("'{value}' does not match YYYY-MM-DDTHH:MM:SSZ"),
                )
            }),
            None => parse_bookmark(&self.config.start_date).map_err(|_| {
                Error::invalid_value(
                    "start_date",
                    format!(
                        "'{}' does not match YYYY-MM-DDTHH:MM:SSZ",
                        self.config.start_date
                    ),
                )
            }),
        }
    }

    async fn sync_stream(
        &mut self,
        stream: &PlannedStream,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let id = stream.id();
        let schema = &stream.entry.schema;
        log(sink, LogLevel::Info, format!("Syncing stream '{id}'"))?;

        if let (ReplicationMethod::Incremental, Some(resolved)) =
            (stream.entry.replication_method(), stream.resolved)
        {
            log(
                sink,
                LogLevel::Warn,
                format!(
                    "Stream '{id}' requests are not filtered by its bookmark ({}); all records are re-read",
                    format_bookmark(resolved)
                ),
            )?;
        }

        sink.send(Message::schema(
            id,
            schema,
            stream.entry.key_properties.clone(),
            stream.bookmark_key.as_deref(),
        ))?;

        let output = self
            .source
            .fetch(&stream.definition, &stream.definition.params)
            .await?;
        self.stats.add_pages(output.pages);
        let time_extracted = Utc::now();

        let transformer = Transformer::new(id, schema);
        let mut tracker = stream
            .resolved
            .map(|resolved| BookmarkTracker::new(stream.definition.bookmark_strategy, resolved));
        let mut emitted = 0usize;

        for raw in output.records {
            let record = transformer.transform(raw)?;
            let candidate = match &stream.bookmark_key {
                Some(key) => bookmark_candidate(id, &record, key)?,
                None => None,
            };

            sink.send(Message::record(id, record, time_extracted))?;
            self.stats.add_record();
            emitted += 1;

            if let (Some(tracker), Some(candidate)) = (tracker.as_mut(), candidate) {
                if let Some(commit) = tracker.observe(candidate) {
                    self.commit(id, commit, sink).await?;
                }
            }
        }

        if let Some(commit) = tracker.as_ref().and_then(BookmarkTracker::finish) {
            self.commit(id, commit, sink).await?;
        }

        log(
            sink,
            LogLevel::Info,
            format!(
                "Stream '{id}': {emitted} records in {} pages ({:?})",
                output.pages, output.stop_reason
            ),
        )
    }

    async fn commit(
        &self,
        stream: &str,
        instant: DateTime<Utc>,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let committed = self.state.advance_bookmark(stream, instant).await?;
        tracing::debug!("Committed bookmark {committed} for stream '{stream}'");
        sink.send(Message::state(&self.state.snapshot().await))
    }
}

/// Replication-key value of a transformed record.
///
/// Missing and null values yield no candidate.
fn bookmark_candidate(
    stream: &str,
    record: &JsonObject,
    key: &str,
) -> Result<Option<DateTime<Utc>>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_record_timestamp(s)
            .map(Some)
            .ok_or_else(|| Error::validation(stream, key, format!("'{s}' is not a timestamp"))),
        Some(other) => Err(Error::validation(
            stream,
            key,
            format!("expected a timestamp string, got {other}"),
        )),
    }
}

fn log(sink: &mut dyn MessageSink, level: LogLevel, message: impl Into<String>) -> Result<()> {
    sink.send(Message::log(level, message))
}
