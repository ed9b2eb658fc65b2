//! Pagination strategy implementations

use super::types::{NextPage, PaginationState, Paginator, StopCondition, StopReason};
use crate::types::StringMap;
use serde_json::Value;

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Requests `?page=1`, `?page=2`, ... until a stop condition matches or
/// the page bound is reached.
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    /// Query parameter name for page number
    pub page_param: String,
    /// First page number
    pub start_page: u32,
    /// Stop conditions, checked in order
    pub stop_conditions: Vec<StopCondition>,
    /// Upper bound on pages per fetch
    pub max_pages: Option<u32>,
}

impl PageNumberPaginator {
    /// Create a new page number paginator that stops on an empty page
    pub fn new(page_param: impl Into<String>, start_page: u32) -> Self {
        Self {
            page_param: page_param.into(),
            start_page,
            stop_conditions: vec![StopCondition::EmptyPage],
            max_pages: None,
        }
    }

    /// Add a stop condition
    #[must_use]
    pub fn with_stop_condition(mut self, condition: StopCondition) -> Self {
        self.stop_conditions.push(condition);
        self
    }

    /// Bound the number of pages
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    fn current_page(&self, state: &PaginationState) -> u32 {
        if state.page == 0 {
            self.start_page
        } else {
            state.page
        }
    }
}

impl Paginator for PageNumberPaginator {
    fn initial_params(&self, state: &PaginationState) -> StringMap {
        let mut params = StringMap::new();
        params.insert(self.page_param.clone(), self.current_page(state).to_string());
        params
    }

    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        let current = self.current_page(state);
        state.pages_fetched += 1;

        // Markers are checked before emptiness
        let mut conditions: Vec<&StopCondition> = self.stop_conditions.iter().collect();
        conditions.sort_by_key(|c| matches!(c, StopCondition::EmptyPage));

        if let Some(reason) = conditions
            .into_iter()
            .find_map(|c| c.check(body, records_count))
        {
            state.mark_done();
            return NextPage::Done(reason);
        }

        state.add_fetched(records_count as u64);

        if self.max_pages.is_some_and(|max| state.pages_fetched >= max) {
            state.mark_done();
            return NextPage::Done(StopReason::PageLimit);
        }

        state.page = current + 1;
        NextPage::with_param(&self.page_param, state.page.to_string())
    }
}
