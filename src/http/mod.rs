//! HTTP client module
//!
//! Transport used by the API fetcher.
//!
//! # Features
//!
//! - **Default Headers**: API token attached to every request
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Retries**: Off by default; bounded retries with backoff when configured

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
