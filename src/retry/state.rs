//! Persisted retry bookkeeping.

use serde::{Deserialize, Serialize};

/// Attempt counter stored under one key.
///
/// Serialized as `{"retryCount":N,"lastRetryAt":MS}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryState {
    pub retry_count: u32,
    pub last_retry_at: u64,
}

/// Where a key sits in the retry state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    Idle,
    Retrying(u32),
    Exhausted,
}

impl RetryState {
    pub fn idle(now_ms: u64) -> Self {
        Self {
            retry_count: 0,
            last_retry_at: now_ms,
        }
    }

    /// Decode a stored record; absent or corrupt input reads as idle.
    pub fn decode(raw: Option<&str>, now_ms: u64) -> Self {
        raw.and_then(|r| serde_json::from_str(r).ok())
            .unwrap_or_else(|| Self::idle(now_ms))
    }

    pub fn encode(&self) -> String {
        // Two integer fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn record_failure(&mut self, now_ms: u64) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_retry_at = now_ms;
    }

    pub fn phase(&self, max_retries: u32) -> RetryPhase {
        if self.retry_count >= max_retries {
            RetryPhase::Exhausted
        } else if self.retry_count == 0 {
            RetryPhase::Idle
        } else {
            RetryPhase::Retrying(self.retry_count)
        }
    }
}

/// Current time as milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
