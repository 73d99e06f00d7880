//! Bounded-concurrency batch execution.
//!
//! Items run in consecutive windows of at most `concurrency` transforms.
//! Windows are strictly sequential and the executor yields to the scheduler
//! between them. Per-item failures are recorded as data and never abort
//! the run.

pub mod executor;
pub mod result;

pub use executor::{run_batches, BatchOptions, DEFAULT_CONCURRENCY};
pub use result::{failure_count, success_count, BatchItemResult, ErrorInfo};
