//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, RetryCommands};
use crate::cli::presentation::{format_ingest_report, format_retry_keys, format_retry_status};
use crate::config::{ConfigLoader, SheetpipeConfig};
use crate::error::ApiError;
use crate::ingest::{FileIngestor, RowCountParser};
use crate::retry::RetryController;
use crate::store::{KeyValueStore, SledStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Runtime context for CLI execution: workspace, resolved config, and store path.
pub struct RunContext {
    config: SheetpipeConfig,
    store_path: PathBuf,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        let store_path = config.storage.resolve_path(&workspace_root);
        Ok(Self { config, store_path })
    }

    pub fn config(&self) -> &SheetpipeConfig {
        &self.config
    }

    pub fn store_path(&self) -> &PathBuf {
        &self.store_path
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let output = match command {
            Commands::Ingest {
                files,
                concurrency,
                format,
            } => self.handle_ingest(files.clone(), *concurrency, format),
            Commands::Retry { command } => self.handle_retry(command),
        }?;
        info!(duration_ms = started.elapsed().as_millis() as u64, "Command finished");
        Ok(output)
    }

    fn handle_ingest(
        &self,
        files: Vec<PathBuf>,
        concurrency: Option<usize>,
        format: &str,
    ) -> Result<String, ApiError> {
        let concurrency = concurrency.unwrap_or(self.config.batch.concurrency);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let ingestor = FileIngestor::new(RowCountParser).with_concurrency(concurrency);
        let report = runtime.block_on(ingestor.ingest(files))?;
        format_ingest_report(&report, format)
    }

    fn handle_retry(&self, command: &RetryCommands) -> Result<String, ApiError> {
        let store = self.open_store()?;
        match command {
            RetryCommands::Status { key, format } => {
                let controller = self.controller(key, store)?;
                format_retry_status(&controller, format)
            }
            RetryCommands::Reset { key } => {
                let controller = self.controller(key, store)?;
                let previous = controller.retry_count();
                controller.reset();
                Ok(format!(
                    "Reset retry state for {} (was {} retries)",
                    key, previous
                ))
            }
            RetryCommands::List => Ok(format_retry_keys(&store.keys()?)),
        }
    }

    fn open_store(&self) -> Result<SledStore, ApiError> {
        std::fs::create_dir_all(&self.store_path)?;
        Ok(SledStore::open(&self.store_path)?)
    }

    fn controller(&self, key: &str, store: SledStore) -> Result<RetryController, ApiError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(store);
        RetryController::with_classifier(
            self.config.retry.controller_config(Some(key.to_string())),
            self.config.retry.classifier(),
            store,
        )
    }
}
