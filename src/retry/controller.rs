//! Retry controller: bounded, persisted retries for transient load failures.

use crate::error::{ApiError, RetryError};
use crate::retry::classify::{ChunkLoadClassifier, DescribeError};
use crate::retry::state::{now_millis, RetryPhase, RetryState};
use crate::store::KeyValueStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on any computed backoff delay.
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

static KEY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Retry configuration, resolved once when a controller is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkLoadRetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_true")]
    pub use_exponential_backoff: bool,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Key the retry record is persisted under; generated when absent.
    #[serde(default)]
    pub storage_key: Option<String>,
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

impl Default for ChunkLoadRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            use_exponential_backoff: default_true(),
            base_delay_ms: default_base_delay_ms(),
            backoff_factor: default_backoff_factor(),
            storage_key: None,
        }
    }
}

impl ChunkLoadRetryConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_delay_ms == 0 {
            return Err("base_delay_ms must be greater than zero".to_string());
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 1.0 {
            return Err(format!(
                "backoff_factor must be greater than 1 (got {})",
                self.backoff_factor
            ));
        }
        if matches!(self.storage_key.as_deref(), Some("")) {
            return Err("storage_key cannot be empty".to_string());
        }
        Ok(())
    }
}

/// How [`RetryController::retry`] reacts to a transient failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryOptions {
    /// Sleep the backoff delay and re-invoke instead of returning to the caller.
    pub delay_before_retry: bool,
}

impl RetryOptions {
    pub fn manual() -> Self {
        Self {
            delay_before_retry: false,
        }
    }

    pub fn automatic() -> Self {
        Self {
            delay_before_retry: true,
        }
    }
}

/// Backoff delay for a given retry count.
///
/// `base * factor^count` capped at [`MAX_RETRY_DELAY_MS`], or `base` when
/// exponential backoff is off.
pub fn backoff_delay_ms(config: &ChunkLoadRetryConfig, retry_count: u32) -> u64 {
    if !config.use_exponential_backoff {
        return config.base_delay_ms;
    }
    let exponent = retry_count.min(i32::MAX as u32) as i32;
    let delay = config.base_delay_ms as f64 * config.backoff_factor.powi(exponent);
    if !delay.is_finite() || delay >= MAX_RETRY_DELAY_MS as f64 {
        MAX_RETRY_DELAY_MS
    } else {
        delay as u64
    }
}

/// Persisted retry controller for one storage key.
///
/// Each controller serializes its own read-modify-write of the record.
/// Separate controllers sharing a key are not coordinated and can lose
/// increments.
pub struct RetryController {
    config: ChunkLoadRetryConfig,
    storage_key: String,
    classifier: ChunkLoadClassifier,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<RetryState>,
    degraded: AtomicBool,
}

impl RetryController {
    pub fn new(
        config: ChunkLoadRetryConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        Self::with_classifier(config, ChunkLoadClassifier::default(), store)
    }

    pub fn with_classifier(
        config: ChunkLoadRetryConfig,
        classifier: ChunkLoadClassifier,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        config.validate().map_err(ApiError::ConfigError)?;
        let storage_key = config
            .storage_key
            .clone()
            .unwrap_or_else(generate_storage_key);

        let controller = Self {
            config,
            storage_key,
            classifier,
            store,
            state: Mutex::new(RetryState::idle(now_millis())),
            degraded: AtomicBool::new(false),
        };
        controller.refresh();
        debug!(
            storage_key = %controller.storage_key,
            retry_count = controller.retry_count(),
            "Retry controller initialized"
        );
        Ok(controller)
    }

    pub fn config(&self) -> &ChunkLoadRetryConfig {
        &self.config
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn classifier(&self) -> &ChunkLoadClassifier {
        &self.classifier
    }

    pub fn state(&self) -> RetryState {
        *self.state.lock()
    }

    pub fn phase(&self) -> RetryPhase {
        self.state.lock().phase(self.config.max_retries)
    }

    pub fn retry_count(&self) -> u32 {
        self.state.lock().retry_count
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count() < self.config.max_retries
    }

    /// Delay before the next attempt, from the current retry count.
    pub fn retry_delay_ms(&self) -> u64 {
        backoff_delay_ms(&self.config, self.retry_count())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms())
    }

    /// True once a store read or write has failed. From then on the retry
    /// count lives only in this controller and is not seen by a rebuilt one.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Return to idle and clear the persisted record.
    pub fn reset(&self) {
        *self.state.lock() = RetryState::idle(now_millis());
        if let Err(e) = self.store.remove(&self.storage_key) {
            self.mark_degraded("remove", &e);
        }
    }

    /// Run `operation`, retrying transient load failures.
    ///
    /// Success resets the key. A non-retryable error comes back as
    /// [`RetryError::Fatal`] with the state untouched. A transient failure
    /// bumps the persisted count; in manual mode it is returned as
    /// [`RetryError::Transient`], in automatic mode the controller sleeps the
    /// backoff delay and runs the operation again. Reaching the bound yields
    /// [`RetryError::Exhausted`], and an exhausted key fails without invoking
    /// the operation.
    pub async fn retry<F, Fut, T, E>(
        &self,
        mut operation: F,
        options: RetryOptions,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + DescribeError + 'static,
    {
        self.refresh();
        let max_retries = self.config.max_retries;

        loop {
            if !self.can_retry() {
                warn!(
                    storage_key = %self.storage_key,
                    max_retries,
                    "Retry bound reached; operation not invoked"
                );
                return Err(RetryError::Exhausted {
                    max_retries,
                    source: None,
                });
            }

            let err = match operation().await {
                Ok(value) => {
                    let previous = self.retry_count();
                    if previous > 0 {
                        info!(
                            storage_key = %self.storage_key,
                            retries = previous,
                            "Operation succeeded after retry"
                        );
                    }
                    self.reset();
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !self.classifier.is_retryable(&err) {
                debug!(
                    storage_key = %self.storage_key,
                    error = %err,
                    "Non-retryable failure propagated"
                );
                return Err(RetryError::Fatal(err));
            }

            let delay = self.retry_delay();
            let retry_count = self.record_failure();

            if retry_count >= max_retries {
                warn!(
                    storage_key = %self.storage_key,
                    retry_count,
                    max_retries,
                    error = %err,
                    "Transient load failure exhausted retries"
                );
                return Err(RetryError::Exhausted {
                    max_retries,
                    source: Some(err),
                });
            }

            if !options.delay_before_retry {
                info!(
                    storage_key = %self.storage_key,
                    retry_count,
                    error = %err,
                    "Transient load failure recorded"
                );
                return Err(RetryError::Transient {
                    source: err,
                    retry_count,
                });
            }

            info!(
                storage_key = %self.storage_key,
                retry_count,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Scheduling automatic retry"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Reload the persisted record. Skipped in degraded mode so the
    /// in-memory count is not overwritten by a stale store.
    fn refresh(&self) {
        if self.is_degraded() {
            return;
        }
        match self.store.get(&self.storage_key) {
            Ok(raw) => {
                *self.state.lock() = RetryState::decode(raw.as_deref(), now_millis());
            }
            Err(e) => self.mark_degraded("get", &e),
        }
    }

    fn record_failure(&self) -> u32 {
        let snapshot = {
            let mut state = self.state.lock();
            state.record_failure(now_millis());
            *state
        };
        if let Err(e) = self.store.set(&self.storage_key, &snapshot.encode()) {
            self.mark_degraded("set", &e);
        }
        snapshot.retry_count
    }

    fn mark_degraded(&self, op: &str, err: &crate::error::StoreError) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            warn!(
                storage_key = %self.storage_key,
                op,
                error = %err,
                "Retry state persistence failed; continuing in memory only"
            );
        }
    }
}

fn generate_storage_key() -> String {
    let seq = KEY_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("chunk_load_retry_{}_{}", now_millis(), seq)
}
