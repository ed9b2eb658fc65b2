//! API fetcher module
//!
//! Retrieves every page of a stream's endpoint and returns the records in
//! API order. The fetcher does not cache between calls and does not retry
//! on its own; retries, if any, are the transport's business.

use crate::config::{StreamDefinition, TapConfig};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig, RequestConfig};
use crate::pagination::{
    NextPage, PageNumberPaginator, PaginationState, Paginator, StopCondition, StopReason,
};
use crate::types::{JsonObject, StringMap};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// API version path segment
pub const API_VERSION: &str = "v2";

/// Query parameter carrying the page number
pub const PAGE_PARAM: &str = "page";

/// Records of one stream, plus how the fetch went
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutput {
    /// Raw records, in API order
    pub records: Vec<JsonObject>,
    /// Page requests made
    pub pages: u32,
    /// Why pagination ended
    pub stop_reason: StopReason,
}

/// Anything that can produce the raw records of a stream
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch all records of a stream using the given base query parameters
    async fn fetch(&self, stream: &StreamDefinition, params: &StringMap) -> Result<FetchOutput>;
}

/// Fetches stream records from the REST API
#[derive(Debug)]
pub struct ApiFetcher {
    client: HttpClient,
    base_url: Url,
    max_pages: Option<u32>,
}

impl ApiFetcher {
    /// Create a fetcher for an API base URL
    pub fn new(client: HttpClient, api_url: &str) -> Result<Self> {
        let base_url = Url::parse(api_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::invalid_value("api_url", "must be a hierarchical URL"));
        }

        Ok(Self {
            client,
            base_url,
            max_pages: None,
        })
    }

    /// Create a fetcher from the tap config
    pub fn from_config(config: &TapConfig) -> Result<Self> {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .max_retries(config.max_retries)
            .header("Authorization", auth_header(&config.api_token));

        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(rps) = config.requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
        }

        let client = HttpClient::with_config(builder.build())?;
        Ok(Self::new(client, &config.api_url)?.with_max_pages(config.max_pages))
    }

    /// Bound the number of pages per stream
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// `<api_url>/v2/<endpoint>`
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::invalid_value("api_url", "must be a hierarchical URL"))?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(endpoint.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn paginator(&self, stream: &StreamDefinition) -> PageNumberPaginator {
        let paginator = PageNumberPaginator::new(PAGE_PARAM, 1).with_max_pages(self.max_pages);
        match &stream.end_marker {
            Some(key) => paginator.with_stop_condition(StopCondition::marker_key(key)),
            None => paginator,
        }
    }
}

#[async_trait]
impl RecordSource for ApiFetcher {
    async fn fetch(&self, stream: &StreamDefinition, params: &StringMap) -> Result<FetchOutput> {
        let url = self.endpoint_url(&stream.endpoint)?;
        let paginator = self.paginator(stream);
        let mut state = PaginationState::new();
        let mut records = Vec::new();

        loop {
            let mut request = RequestConfig::new();
            for (key, value) in params.iter().chain(&paginator.initial_params(&state)) {
                request = request.query(key, value);
            }

            debug!("GET {url} {:?}", request.query);
            let response = self.client.get_with_config(url.as_str(), request).await?;
            let body_text = response.text().await.map_err(|e| {
                Error::fetch(&stream.id, format!("Failed to read response body: {e}"))
            })?;
            let body: Value = serde_json::from_str(&body_text).map_err(|e| {
                Error::fetch(&stream.id, format!("Response is not valid JSON: {e}"))
            })?;

            let page_len = body.as_array().map_or(0, Vec::len);
            let next = paginator.process_response(&body, page_len, &mut state);

            if !body.is_array() && next != NextPage::Done(StopReason::EndMarker) {
                return Err(Error::fetch(
                    &stream.id,
                    format!("Expected a JSON array of records, got: {}", truncate(&body_text)),
                ));
            }

            info!(
                "Stream '{}' page {}: {page_len} records",
                stream.id, state.pages_fetched
            );

            match next {
                NextPage::Continue { .. } => records.extend(decode_page(&stream.id, body)?),
                NextPage::Done(reason) => {
                    if reason.keeps_page() {
                        records.extend(decode_page(&stream.id, body)?);
                    }
                    match reason {
                        StopReason::PageLimit => warn!(
                            "Stream '{}' stopped at the page limit ({} pages); more data may remain",
                            stream.id, state.pages_fetched
                        ),
                        StopReason::EndMarker => debug!(
                            "Stream '{}' end marker on page {}: {}",
                            stream.id,
                            state.pages_fetched,
                            truncate(&body_text)
                        ),
                        StopReason::EmptyPage => {}
                    }
                    return Ok(FetchOutput {
                        records,
                        pages: state.pages_fetched,
                        stop_reason: reason,
                    });
                }
            }
        }
    }
}

/// Value of the `Authorization` header for an API token
pub fn auth_header(token: &str) -> String {
    format!("Token \"{token}\"")
}

/// Split a page into record objects
fn decode_page(stream: &str, body: Value) -> Result<Vec<JsonObject>> {
    let Value::Array(items) = body else {
        return Err(Error::fetch(stream, "Expected a JSON array of records"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(Error::fetch(
                stream,
                format!("Record {index} is not a JSON object: {other}"),
            )),
        })
        .collect()
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 200;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
