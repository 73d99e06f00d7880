//! Chunk-load retry control.
//!
//! Classifies transient "dynamically-loaded resource" failures and drives
//! bounded, exponentially delayed retries. The attempt counter is persisted
//! per storage key through an injected [`crate::store::KeyValueStore`], so a
//! controller rebuilt after teardown picks up where the previous one stopped.

pub mod classify;
pub mod controller;
pub mod state;

pub use classify::{
    is_retryable_load_error, ChunkLoadClassifier, DescribeError, LoadError,
    CHUNK_LOAD_ERROR_KIND, DEFAULT_LOAD_MARKERS,
};
pub use controller::{
    backoff_delay_ms, ChunkLoadRetryConfig, RetryController, RetryOptions, MAX_RETRY_DELAY_MS,
};
pub use state::{now_millis, RetryPhase, RetryState};
