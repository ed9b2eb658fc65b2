//! CLI arguments

use clap::Parser;
use std::path::PathBuf;

/// Bling ERP tap: discovers streams and extracts their records as JSON lines
#[derive(Parser, Debug)]
#[command(name = "bling-tap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Print the catalog and exit
    #[arg(short, long, conflicts_with = "catalog")]
    pub discover: bool,

    /// Catalog file selecting the streams to sync (JSON)
    #[arg(long, alias = "properties")]
    pub catalog: Option<PathBuf>,

    /// State file (JSON), rewritten on every bookmark commit
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Directory of stream schemas (defaults to the bundled schemas)
    #[arg(long)]
    pub schemas: Option<PathBuf>,

    /// Stream definition table (YAML, defaults to the bundled table)
    #[arg(long)]
    pub streams: Option<PathBuf>,

    /// Abort the run on the first failing stream
    #[arg(long)]
    pub fail_fast: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a run does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print the catalog
    Discover,
    /// Extract records
    Sync,
}

impl Cli {
    /// Mode selected by the flags
    pub fn mode(&self) -> Mode {
        if self.discover {
            Mode::Discover
        } else {
            Mode::Sync
        }
    }

    /// Default log filter directive
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
