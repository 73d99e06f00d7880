//! Transient load failure classification.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Declared kind of a failed dynamic chunk fetch.
pub const CHUNK_LOAD_ERROR_KIND: &str = "ChunkLoadError";

/// Message fragments that mark a dynamic module load failure. Matched
/// case-insensitively.
pub const DEFAULT_LOAD_MARKERS: &[&str] = &[
    "loading chunk",
    "loading css chunk",
    "failed to fetch dynamically imported module",
    "error loading dynamically imported module",
    "importing a module script failed",
];

/// What the classifier needs to know about an error.
pub trait DescribeError {
    /// Declared kind or name of the error, if it carries one.
    fn kind(&self) -> Option<&str> {
        None
    }

    fn message(&self) -> String;
}

/// Error reported by a host for a failed resource load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct LoadError {
    pub kind: String,
    pub message: String,
}

impl LoadError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// A failure of kind [`CHUNK_LOAD_ERROR_KIND`].
    pub fn chunk(message: impl Into<String>) -> Self {
        Self::new(CHUNK_LOAD_ERROR_KIND, message)
    }
}

impl DescribeError for LoadError {
    fn kind(&self) -> Option<&str> {
        Some(&self.kind)
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

impl DescribeError for std::io::Error {
    fn message(&self) -> String {
        self.to_string()
    }
}

impl DescribeError for str {
    fn message(&self) -> String {
        self.to_string()
    }
}

impl DescribeError for String {
    fn message(&self) -> String {
        self.clone()
    }
}

/// Closed set of recognized transient-load markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkLoadClassifier {
    kind: String,
    markers: Vec<String>,
}

impl Default for ChunkLoadClassifier {
    fn default() -> Self {
        Self::new(CHUNK_LOAD_ERROR_KIND, DEFAULT_LOAD_MARKERS.iter().copied())
    }
}

impl ChunkLoadClassifier {
    pub fn new<I, S>(kind: impl Into<String>, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            kind: kind.into(),
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn with_marker(mut self, marker: impl AsRef<str>) -> Self {
        let marker = marker.as_ref().to_lowercase();
        if !marker.is_empty() && !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn matches(&self, kind: Option<&str>, message: &str) -> bool {
        if kind == Some(self.kind.as_str()) {
            return true;
        }
        let message = message.to_lowercase();
        self.markers.iter().any(|m| message.contains(m.as_str()))
    }

    pub fn is_retryable<E: DescribeError + ?Sized>(&self, error: &E) -> bool {
        self.matches(error.kind(), &error.message())
    }
}

/// Classify with the default kind and markers.
pub fn is_retryable_load_error<E: DescribeError + ?Sized>(error: &E) -> bool {
    static DEFAULT: OnceLock<ChunkLoadClassifier> = OnceLock::new();
    DEFAULT
        .get_or_init(ChunkLoadClassifier::default)
        .is_retryable(error)
}
