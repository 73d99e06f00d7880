//! Monotonic progress aggregate for a batch of file parses.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStage {
    Reading,
    Parsing,
}

/// Failure recorded for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub file_name: String,
    pub error: String,
}

/// Progress of one batch run.
///
/// `total` is fixed at start, `completed` only grows and never passes
/// `total`, and `errors` is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseProgress {
    total: usize,
    completed: usize,
    stage: ParseStage,
    errors: Vec<ParseError>,
}

impl ParseProgress {
    pub fn start(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            stage: ParseStage::Reading,
            errors: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn stage(&self) -> ParseStage {
        self.stage
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn set_stage(&mut self, stage: ParseStage) {
        self.stage = stage;
    }

    /// Count one finished item. Returns false once `total` is reached.
    pub fn record_completion(&mut self) -> bool {
        if self.completed >= self.total {
            return false;
        }
        self.completed += 1;
        true
    }

    pub fn record_error(&mut self, file_name: impl Into<String>, error: impl Into<String>) {
        self.errors.push(ParseError {
            file_name: file_name.into(),
            error: error.into(),
        });
    }
}

/// Shared handle to the progress of the current batch.
#[derive(Debug, Clone)]
pub struct ParseTracker {
    inner: Arc<RwLock<ParseProgress>>,
}

impl Default for ParseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ParseProgress::start(0))),
        }
    }

    /// Replace the current progress with a fresh run of `total` items.
    pub fn begin(&self, total: usize) {
        *self.inner.write() = ParseProgress::start(total);
    }

    pub fn snapshot(&self) -> ParseProgress {
        self.inner.read().clone()
    }

    pub fn set_stage(&self, stage: ParseStage) {
        self.inner.write().set_stage(stage);
    }

    pub fn complete_item(&self) -> usize {
        let mut progress = self.inner.write();
        progress.record_completion();
        progress.completed()
    }

    pub fn fail_item(&self, file_name: impl Into<String>, error: impl Into<String>) {
        self.inner.write().record_error(file_name, error);
    }
}
