//! Per-item batch outcomes.

use serde::{Deserialize, Serialize};
use std::any::Any;

/// Captured failure of one transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Describe a panic payload caught from a transform.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::new(format!("transform panicked: {}", detail))
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of one input item. Holds exactly one of a value or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResult<R> {
    index: usize,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

impl<R> BatchItemResult<R> {
    pub fn success(index: usize, value: R) -> Self {
        Self {
            index,
            ok: true,
            value: Some(value),
            error: None,
        }
    }

    pub fn failure(index: usize, error: ErrorInfo) -> Self {
        Self {
            index,
            ok: false,
            value: None,
            error: Some(error),
        }
    }

    /// Position of the item in the input sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn value(&self) -> Option<&R> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn into_result(self) -> Result<R, ErrorInfo> {
        match (self.value, self.error) {
            (Some(value), _) => Ok(value),
            (None, Some(error)) => Err(error),
            (None, None) => Err(ErrorInfo::new("missing batch outcome")),
        }
    }
}

pub fn success_count<R>(results: &[BatchItemResult<R>]) -> usize {
    results.iter().filter(|r| r.ok).count()
}

pub fn failure_count<R>(results: &[BatchItemResult<R>]) -> usize {
    results.iter().filter(|r| !r.ok).count()
}
