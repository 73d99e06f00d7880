//! Sheetpipe: bounded-concurrency spreadsheet ingestion and chunk-load retry control.
//!
//! Two independent cores: a batch executor that runs heavyweight transforms in
//! sequential windows of bounded concurrency, and a retry controller that
//! persists transient load failures per key and drives capped exponential
//! backoff. They compose only through the host, as in [`ingest`].

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod store;
