//! Output module
//!
//! Handles the message stream a sync produces.
//!
//! # Overview
//!
//! This module provides:
//! - `Message` - SCHEMA, RECORD, STATE and LOG messages
//! - `MessageSink` - where messages go
//! - `JsonLinesWriter` - JSON lines on stdout, LOG forwarded to `tracing`
//! - `MemorySink` - in-memory collection

mod message;
mod writer;

pub use message::Message;
pub use writer::{JsonLinesWriter, MemorySink, MessageSink};
