//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Modes
//!
//! - `--discover` - Print the catalog
//! - default - Sync the selected streams as JSON lines on stdout

mod commands;
mod runner;

pub use commands::{Cli, Mode};
pub use runner::Runner;
