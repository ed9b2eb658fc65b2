// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Bling Tap
//!
//! Incremental extraction of Bling ERP records (orders, products, clients)
//! as a stream of SCHEMA, RECORD and STATE messages.
//!
//! ## Features
//!
//! - **Discovery**: Catalog built from bundled JSON schemas and a YAML
//!   stream table
//! - **Pagination**: Page-number paging that stops on an empty page or on
//!   the API's end-of-data marker
//! - **Validation**: Records coerced to their stream schema before emission
//! - **Incremental Sync**: Monotone per-stream bookmarks persisted between runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bling_tap::catalog::discover;
//! use bling_tap::config::{StreamTable, TapConfig};
//! use bling_tap::engine::{SyncConfig, SyncEngine};
//! use bling_tap::fetch::ApiFetcher;
//! use bling_tap::output::JsonLinesWriter;
//! use bling_tap::schema::bundled_schemas;
//! use bling_tap::state::StateManager;
//!
//! #[tokio::main]
//! async fn main() -> bling_tap::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let streams = StreamTable::bundled()?;
//!     let catalog = discover(&bundled_schemas()?, &streams)?;
//!
//!     let mut engine = SyncEngine::new(
//!         ApiFetcher::from_config(&config)?,
//!         StateManager::from_file("state.json")?,
//!         streams,
//!         SyncConfig::new(config.start_date.clone()),
//!     );
//!     engine.sync(&catalog, &mut JsonLinesWriter::stdout()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Sync Engine                           │
//! │  resolve bookmarks → SCHEMA → fetch → transform → RECORD     │
//! │                                        → commit → STATE      │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬──────────┐
//! │ Catalog  │   Fetch   │   Paginate    │ Transform │  State   │
//! ├──────────┼───────────┼───────────────┼───────────┼──────────┤
//! │ Schemas  │ HTTP      │ Page number   │ Coercion  │ Bookmarks│
//! │ Streams  │ Retry     │ Empty page    │ Required  │ Atomic   │
//! │ Metadata │ Rate Limit│ End marker    │ date-time │ writes   │
//! └──────────┴───────────┴───────────────┴───────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Bookmark formats and strategies
pub mod bookmark;

/// Tap configuration and stream definitions
pub mod config;

/// JSON schema model and registry
pub mod schema;

/// Catalog discovery and selection
pub mod catalog;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Paged record retrieval from the API
pub mod fetch;

/// Schema-driven record validation and coercion
pub mod transform;

/// State management and bookmark persistence
pub mod state;

/// Output messages and sinks
pub mod output;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::{discover, Catalog};
pub use config::{StreamDefinition, StreamTable, TapConfig};
pub use engine::{SyncConfig, SyncEngine, SyncStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
