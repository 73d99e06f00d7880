//! File ingestion: reads files and hands them to a parser through the batch executor.
//!
//! Parsing itself is injected through [`SheetParser`]; this module owns the
//! reading stage, per-file failure capture, and the [`ParseProgress`] of the run.

use crate::batch::{run_batches, BatchItemResult, BatchOptions, DEFAULT_CONCURRENCY};
use crate::error::{BatchError, IngestError};
use crate::progress::{ParseProgress, ParseStage, ParseTracker};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Turns the raw bytes of one file into a parsed value.
#[allow(async_fn_in_trait)]
pub trait SheetParser: Send + Sync {
    type Output;

    async fn parse(&self, file_name: &str, bytes: Vec<u8>) -> Result<Self::Output, IngestError>;
}

/// Row and size summary of a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub rows: usize,
    pub bytes: usize,
}

/// Counts non-empty lines. Rejects empty files.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowCountParser;

impl SheetParser for RowCountParser {
    type Output = SheetSummary;

    async fn parse(&self, file_name: &str, bytes: Vec<u8>) -> Result<SheetSummary, IngestError> {
        let text = String::from_utf8_lossy(&bytes);
        let rows = text.lines().filter(|l| !l.trim().is_empty()).count();
        if rows == 0 {
            return Err(IngestError::Parse {
                file_name: file_name.to_string(),
                message: "no rows found".to_string(),
            });
        }
        Ok(SheetSummary {
            rows,
            bytes: bytes.len(),
        })
    }
}

type Observer = Arc<dyn Fn(&ParseProgress) + Send + Sync>;

/// Result of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport<R> {
    pub file_names: Vec<String>,
    pub results: Vec<BatchItemResult<R>>,
    pub progress: ParseProgress,
}

impl<R> IngestReport<R> {
    pub fn succeeded(&self) -> usize {
        crate::batch::success_count(&self.results)
    }

    pub fn failed(&self) -> usize {
        crate::batch::failure_count(&self.results)
    }
}

pub struct FileIngestor<P> {
    parser: P,
    concurrency: usize,
    tracker: ParseTracker,
    observer: Option<Observer>,
}

impl<P: SheetParser> FileIngestor<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            concurrency: DEFAULT_CONCURRENCY,
            tracker: ParseTracker::new(),
            observer: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Receive a progress snapshot after every file completes.
    pub fn with_observer(mut self, observer: impl Fn(&ParseProgress) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Handle to the progress of the current or last run.
    pub fn tracker(&self) -> ParseTracker {
        self.tracker.clone()
    }

    pub async fn ingest(
        &self,
        paths: Vec<PathBuf>,
    ) -> Result<IngestReport<P::Output>, BatchError> {
        if self.concurrency == 0 {
            return Err(BatchError::InvalidConcurrency(self.concurrency));
        }

        let file_names: Vec<String> = paths.iter().map(|p| display_name(p)).collect();
        self.tracker.begin(paths.len());
        info!(files = paths.len(), concurrency = self.concurrency, "Ingestion started");

        let tracker = &self.tracker;
        let parser = &self.parser;
        let observer = self.observer.clone();
        let names = &file_names;

        let options = BatchOptions::new()
            .concurrency(self.concurrency)
            .on_item_failed(move |index, error| {
                tracker.fail_item(&names[index], error.message.clone());
            })
            .on_progress(move |completed, total| {
                tracker.complete_item();
                debug!(completed, total, "File completed");
                if let Some(observer) = &observer {
                    observer(&tracker.snapshot());
                }
            });

        let results = run_batches(
            paths,
            |path| async move {
                let file_name = display_name(&path);
                read_and_parse(parser, tracker, &path, &file_name).await
            },
            options,
        )
        .await?;

        let progress = self.tracker.snapshot();
        info!(
            total = progress.total(),
            failed = progress.error_count(),
            "Ingestion completed"
        );
        Ok(IngestReport {
            file_names,
            results,
            progress,
        })
    }
}

async fn read_and_parse<P: SheetParser>(
    parser: &P,
    tracker: &ParseTracker,
    path: &Path,
    file_name: &str,
) -> Result<P::Output, IngestError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| IngestError::Read {
        path: path.display().to_string(),
        source,
    })?;
    tracker.set_stage(ParseStage::Parsing);
    parser.parse(file_name, bytes).await
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
