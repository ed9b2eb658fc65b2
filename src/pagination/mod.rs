//! Pagination module
//!
//! The API pages with a `page` query parameter starting at 1 and signals
//! exhaustion through the payload (an empty array or an end marker), never
//! through the status code.

mod strategies;
mod types;

pub use strategies::PageNumberPaginator;
pub use types::{NextPage, PaginationState, Paginator, StopCondition, StopReason};
