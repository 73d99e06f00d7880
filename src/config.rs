//! Configuration System
//!
//! Layered configuration for batch ingestion, chunk-load retry, storage, and
//! logging. Defaults, a user-level file, workspace files, and environment
//! variables are merged in that order and validated before use.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::retry::{ChunkLoadClassifier, ChunkLoadRetryConfig, CHUNK_LOAD_ERROR_KIND, DEFAULT_LOAD_MARKERS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetpipeConfig {
    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Batch executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum transforms in flight per window
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    crate::batch::DEFAULT_CONCURRENCY
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Chunk-load retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_true")]
    pub use_exponential_backoff: bool,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Error kind treated as a transient load failure
    #[serde(default = "default_error_kind")]
    pub error_kind: String,

    /// Case-insensitive message markers of a transient load failure
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_error_kind() -> String {
    CHUNK_LOAD_ERROR_KIND.to_string()
}

fn default_markers() -> Vec<String> {
    DEFAULT_LOAD_MARKERS.iter().map(|m| m.to_string()).collect()
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            use_exponential_backoff: default_true(),
            base_delay_ms: default_base_delay_ms(),
            backoff_factor: default_backoff_factor(),
            error_kind: default_error_kind(),
            markers: default_markers(),
        }
    }
}

impl RetrySection {
    /// Controller configuration for one storage key.
    pub fn controller_config(&self, storage_key: Option<String>) -> ChunkLoadRetryConfig {
        ChunkLoadRetryConfig {
            max_retries: self.max_retries,
            use_exponential_backoff: self.use_exponential_backoff,
            base_delay_ms: self.base_delay_ms,
            backoff_factor: self.backoff_factor,
            storage_key,
        }
    }

    pub fn classifier(&self) -> ChunkLoadClassifier {
        ChunkLoadClassifier::new(self.error_kind.clone(), &self.markers)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.controller_config(None).validate()?;
        if self.error_kind.trim().is_empty() {
            return Err("error_kind cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Storage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database holding persisted retry records
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".sheetpipe/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

impl StorageConfig {
    /// Resolve the store path; relative paths are taken from the workspace root.
    pub fn resolve_path(&self, workspace_root: &Path) -> PathBuf {
        if self.store_path.is_absolute() {
            self.store_path.clone()
        } else {
            workspace_root.join(&self.store_path)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Batch(String),
    Retry(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Batch(msg) => write!(f, "Batch: {}", msg),
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SheetpipeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.batch.concurrency == 0 {
            errors.push(ValidationError::Batch(
                "concurrency must be greater than zero".to_string(),
            ));
        }
        if let Err(e) = self.retry.validate() {
            errors.push(ValidationError::Retry(e));
        }
        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one configuration error.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            ApiError::ConfigError(joined)
        })
    }
}
