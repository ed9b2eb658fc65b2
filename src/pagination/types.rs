//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by the fetcher.

use crate::types::StringMap;
use serde_json::Value;

/// Why pagination ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The API returned an empty page
    EmptyPage,
    /// The payload carried the API's end/error marker
    EndMarker,
    /// The configured page bound was reached
    PageLimit,
}

impl StopReason {
    /// Whether the records of the final page belong to the result
    pub fn keeps_page(&self) -> bool {
        matches!(self, StopReason::PageLimit)
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// More pages available with these parameters
    Continue {
        /// Query parameters to add/replace
        query_params: StringMap,
    },
    /// No more pages
    Done(StopReason),
}

impl NextPage {
    /// Create a continuation with a single parameter
    pub fn with_param(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut params = StringMap::new();
        params.insert(key.into(), value.into());
        Self::Continue {
            query_params: params,
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Stop conditions for pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCondition {
    /// Stop when page is empty (no records)
    EmptyPage,

    /// Stop when the payload is an object carrying a marker key.
    ///
    /// Some endpoints signal "no more data" (and some errors) with a body
    /// like `{"msg": "..."}` under a 200 status, so exhaustion has to be read
    /// from the payload rather than the status code. Record arrays never
    /// match, even when a record has a field of that name.
    MarkerKey {
        /// Key whose presence ends pagination
        key: String,
    },
}

impl StopCondition {
    /// Create a marker-key stop condition
    pub fn marker_key(key: impl Into<String>) -> Self {
        Self::MarkerKey { key: key.into() }
    }

    /// Check this condition against a page
    pub fn check(&self, body: &Value, records_count: usize) -> Option<StopReason> {
        match self {
            StopCondition::EmptyPage => (records_count == 0).then_some(StopReason::EmptyPage),
            StopCondition::MarkerKey { key } => body
                .as_object()
                .is_some_and(|map| map.contains_key(key))
                .then_some(StopReason::EndMarker),
        }
    }
}

/// Tracks pagination state during one fetch
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Page to request next (0 = not started)
    pub page: u32,
    /// Pages fetched so far
    pub pages_fetched: u32,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: u64) {
        self.total_fetched += count;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Query parameters for the next request
    fn initial_params(&self, state: &PaginationState) -> StringMap;

    /// Process a response and determine if there's a next page
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage;
}
