//! State management module
//!
//! Tracks the bookmark of every stream between runs so each sync can pick
//! up where the previous one stopped.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Flat map of stream id to bookmark
//! - `StateManager` - File-based state persistence with monotone bookmarks

mod manager;
mod types;

pub use manager::StateManager;
pub use types::State;
