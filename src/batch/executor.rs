//! Batch executor: runs transforms window by window with bounded concurrency.

use crate::batch::result::{BatchItemResult, ErrorInfo};
use crate::error::BatchError;
use futures::stream::{self, FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info};

pub const DEFAULT_CONCURRENCY: usize = 3;

type ProgressFn<'a> = Box<dyn FnMut(usize, usize) + Send + 'a>;
type FailureFn<'a> = Box<dyn FnMut(usize, &ErrorInfo) + Send + 'a>;
type BoundaryFn<'a> = Box<dyn FnMut() + Send + 'a>;

/// Options for one [`run_batches`] invocation.
pub struct BatchOptions<'a> {
    concurrency: usize,
    on_progress: Option<ProgressFn<'a>>,
    on_item_failed: Option<FailureFn<'a>>,
    on_batch_boundary: Option<BoundaryFn<'a>>,
}

impl Default for BatchOptions<'_> {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            on_progress: None,
            on_item_failed: None,
            on_batch_boundary: None,
        }
    }
}

impl<'a> BatchOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Called as `(completed, total)` after each item finishes, in completion order.
    pub fn on_progress(mut self, f: impl FnMut(usize, usize) + Send + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Called as `(index, error)` for every failed item, errors and panics
    /// alike, just before its progress tick.
    pub fn on_item_failed(mut self, f: impl FnMut(usize, &ErrorInfo) + Send + 'a) -> Self {
        self.on_item_failed = Some(Box::new(f));
        self
    }

    /// Called once after each window drains, before the executor yields.
    pub fn on_batch_boundary(mut self, f: impl FnMut() + Send + 'a) -> Self {
        self.on_batch_boundary = Some(Box::new(f));
        self
    }
}

/// Run `transform` over `items` in windows of the configured concurrency.
///
/// Results come back in input order, one per item. A transform that errors
/// or panics is recorded as a failed result; its siblings and later windows
/// still run. Window `n + 1` is not started until every transform of window
/// `n` has resolved. Only a zero concurrency is rejected.
pub async fn run_batches<T, R, E, F, Fut>(
    items: Vec<T>,
    transform: F,
    mut options: BatchOptions<'_>,
) -> Result<Vec<BatchItemResult<R>>, BatchError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
{
    let concurrency = options.concurrency;
    if concurrency == 0 {
        return Err(BatchError::InvalidConcurrency(concurrency));
    }

    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    info!(total, concurrency, "Batch run started");

    let mut slots: Vec<Option<BatchItemResult<R>>> = (0..total).map(|_| None).collect();
    let mut completed = 0usize;
    let mut failed = 0usize;
    let mut window_index = 0usize;
    let mut pending = items.into_iter().enumerate().peekable();

    while pending.peek().is_some() {
        let mut in_flight = FuturesUnordered::new();
        let mut rejected = Vec::new();
        for (index, item) in pending.by_ref().take(concurrency) {
            // A transform may panic before it ever returns a future.
            match std::panic::catch_unwind(AssertUnwindSafe(|| transform(item))) {
                Ok(fut) => {
                    in_flight.push(async move { (index, AssertUnwindSafe(fut).catch_unwind().await) })
                }
                Err(payload) => {
                    rejected.push(BatchItemResult::failure(index, ErrorInfo::from_panic(payload)))
                }
            }
        }
        debug!(
            window_index,
            size = in_flight.len() + rejected.len(),
            "Batch window launched"
        );

        let mut window = stream::iter(rejected).chain(in_flight.map(|(index, outcome)| match outcome {
            Ok(Ok(value)) => BatchItemResult::success(index, value),
            Ok(Err(err)) => BatchItemResult::failure(index, ErrorInfo::new(err.to_string())),
            Err(payload) => BatchItemResult::failure(index, ErrorInfo::from_panic(payload)),
        }));

        while let Some(result) = window.next().await {
            let index = result.index();
            if let Some(error) = result.error() {
                failed += 1;
                debug!(index, error = %error, "Batch item failed");
                if let Some(on_failed) = options.on_item_failed.as_mut() {
                    on_failed(index, error);
                }
            }
            slots[index] = Some(result);
            completed += 1;
            if let Some(on_progress) = options.on_progress.as_mut() {
                on_progress(completed, total);
            }
        }

        debug!(window_index, completed, total, "Batch window drained");
        if let Some(on_boundary) = options.on_batch_boundary.as_mut() {
            on_boundary();
        }
        window_index += 1;

        if pending.peek().is_some() {
            tokio::task::yield_now().await;
        }
    }

    info!(
        total,
        failed,
        windows = window_index,
        "Batch run completed"
    );
    Ok(slots.into_iter().flatten().collect())
}
