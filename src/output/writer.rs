//! Message sinks
//!
//! Data messages are written as JSON lines. LOG messages go to `tracing`.

use super::message::Message;
use crate::error::{Error, Result};
use crate::types::LogLevel;
use std::io::{self, Stdout, Write};
use tracing::{debug, error, info, warn};

/// Destination for sync messages
pub trait MessageSink: Send {
    /// Deliver one message
    fn send(&mut self, message: Message) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes data messages as JSON lines
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    /// Number of data messages written
    messages_written: u64,
}

impl JsonLinesWriter<Stdout> {
    /// Writer on the process stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonLinesWriter<W> {
    /// Create a writer over any `Write`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            messages_written: 0,
        }
    }

    /// Get the number of data messages written so far
    #[must_use]
    pub fn messages_written(&self) -> u64 {
        self.messages_written
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageSink for JsonLinesWriter<W> {
    fn send(&mut self, message: Message) -> Result<()> {
        if let Message::Log { level, message } = &message {
            forward_log(*level, message);
            return Ok(());
        }

        let line = serde_json::to_string(&message)
            .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;
        writeln!(self.writer, "{line}")
            .map_err(|e| Error::output(format!("Failed to write message: {e}")))?;

        // STATE must be visible before the next record is produced
        if matches!(message, Message::State { .. }) {
            self.writer
                .flush()
                .map_err(|e| Error::output(format!("Failed to flush output: {e}")))?;
        }

        self.messages_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::output(format!("Failed to flush output: {e}")))
    }
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Vec<Message>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received, in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Messages other than LOG, in order
    pub fn data_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.is_log())
    }
}

impl MessageSink for MemorySink {
    fn send(&mut self, message: Message) -> Result<()> {
        self.messages.push(message);
        Ok(())
    }
}

fn forward_log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => debug!("{message}"),
        LogLevel::Info => info!("{message}"),
        LogLevel::Warn => warn!("{message}"),
        LogLevel::Error => error!("{message}"),
    }
}
