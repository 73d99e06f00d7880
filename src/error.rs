//! Error types for the sheetpipe batch and retry core.

use thiserror::Error;

/// Key-value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store quota exceeded writing {key:?} (limit {limit} bytes)")]
    QuotaExceeded { key: String, limit: usize },

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Batch executor errors. Per-item failures never surface here.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid concurrency {0}: must be greater than zero")]
    InvalidConcurrency(usize),
}

/// Failure of one file during ingestion
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {file_name}: {message}")]
    Parse { file_name: String, message: String },
}

/// Errors raised by [`crate::retry::RetryController::retry`].
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// The operation failed with an error that is not a transient load failure.
    #[error(transparent)]
    Fatal(E),

    /// Transient load failure recorded; the caller may retry later.
    #[error("Transient load failure (retry {retry_count}): {source}")]
    Transient {
        #[source]
        source: E,
        retry_count: u32,
    },

    /// Retry bound reached. Terminal for this storage key until reset.
    #[error("Maximum retries ({max_retries}) exceeded; reload required")]
    Exhausted {
        max_retries: u32,
        #[source]
        source: Option<E>,
    },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, RetryError::Transient { .. })
    }

    /// The operation's own error, if this failure carries one.
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::Fatal(err) => Some(err),
            RetryError::Transient { source, .. } => Some(source),
            RetryError::Exhausted { source, .. } => source,
        }
    }
}

/// Top-level errors for hosts and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),

    #[error("Batch error: {0}")]
    BatchError(#[from] BatchError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
