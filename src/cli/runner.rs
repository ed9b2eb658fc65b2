//! CLI runner - executes the selected mode

use crate::catalog::{discover, Catalog};
use crate::cli::commands::{Cli, Mode};
use crate::config::{StreamTable, TapConfig};
use crate::engine::{SyncConfig, SyncEngine};
use crate::error::{Error, Result};
use crate::fetch::ApiFetcher;
use crate::output::JsonLinesWriter;
use crate::schema::{bundled_schemas, load_schemas, SchemaMap};
use crate::state::StateManager;
use std::io::Write;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match self.cli.mode() {
            Mode::Discover => self.discover(),
            Mode::Sync => self.sync().await,
        }
    }

    /// Load and validate the tap config
    fn load_config(&self) -> Result<TapConfig> {
        TapConfig::from_file(&self.cli.config)
    }

    /// Schemas from `--schemas`, or the bundled ones
    fn load_schemas(&self) -> Result<SchemaMap> {
        match &self.cli.schemas {
            Some(dir) => load_schemas(dir),
            None => bundled_schemas(),
        }
    }

    /// Stream table from `--streams`, or the bundled one
    fn load_streams(&self) -> Result<StreamTable> {
        match &self.cli.streams {
            Some(path) => StreamTable::from_file(path),
            None => StreamTable::bundled(),
        }
    }

    /// Catalog from `--catalog`, or a freshly discovered one
    pub fn catalog(&self, streams: &StreamTable) -> Result<Catalog> {
        match &self.cli.catalog {
            Some(path) => Catalog::from_file(path),
            None => discover(&self.load_schemas()?, streams),
        }
    }

    /// Print the catalog document
    fn discover(&self) -> Result<()> {
        self.load_config()?;
        let streams = self.load_streams()?;
        let catalog = discover(&self.load_schemas()?, &streams)?;
        info!("Discovered {} streams", catalog.streams.len());

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", catalog.to_json_pretty()?)
            .map_err(|e| Error::output(format!("Failed to write catalog: {e}")))?;
        Ok(())
    }

    /// Sync the selected streams
    async fn sync(&self) -> Result<()> {
        let config = self.load_config()?;
        let streams = self.load_streams()?;
        let catalog = self.catalog(&streams)?;

        let state = match &self.cli.state {
            Some(path) => StateManager::from_file(path)?,
            None => {
                warn!("No state file given; bookmarks will not be persisted");
                StateManager::in_memory()
            }
        };

        let fetcher = ApiFetcher::from_config(&config)?;
        let mut engine = SyncEngine::new(
            fetcher,
            state,
            streams,
            SyncConfig::new(config.start_date.clone()).with_fail_fast(self.cli.fail_fast),
        );

        let mut sink = JsonLinesWriter::stdout();
        let result = engine.sync(&catalog, &mut sink).await;

        let stats = engine.stats();
        info!(
            "{} records from {} streams ({} failed), {} pages in {}ms",
            stats.records_synced,
            stats.streams_synced,
            stats.streams_failed(),
            stats.pages_fetched,
            stats.duration_ms
        );

        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_config(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("config.json");
        std::fs::write(
            &path,
            json!({
                "start_date": "2020-01-01T00:00:00Z",
                "api_token": "T",
                "api_url": "https://x.test"
            })
            .to_string(),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_catalog_defaults_to_discovery() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());
        let cli = Cli::try_parse_from(["bling-tap", "--config", config.to_str().unwrap()]).unwrap();
        let runner = Runner::new(cli);

        let streams = StreamTable::bundled().unwrap();
        let catalog = runner.catalog(&streams).unwrap();
        assert_eq!(catalog.streams.len(), 3);
        assert!(catalog.get("orders").is_some_and(|s| !s.is_selected()));
    }

    #[test]
    fn test_catalog_from_file() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path());
        let catalog_path = dir.path().join("catalog.json");
        std::fs::write(&catalog_path, r#"{"streams": []}"#).unwrap();

        let cli = Cli::try_parse_from([
            "bling-tap",
            "--config",
            config.to_str().unwrap(),
            "--catalog",
            catalog_path.to_str().unwrap(),
        ])
        .unwrap();

        let catalog = Runner::new(cli)
            .catalog(&StreamTable::bundled().unwrap())
            .unwrap();
        assert!(catalog.streams.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_sync() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{"api_token": "T", "api_url": "https://x.test"}"#).unwrap();

        let cli = Cli::try_parse_from(["bling-tap", "-c", config.to_str().unwrap()]).unwrap();
        let err = Runner::new(cli).run().await.unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "start_date"));
    }
}
