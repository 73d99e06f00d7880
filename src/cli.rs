//! CLI domain: parse, route, output, and presentation only.
//! Domain work lives in the batch, ingest, and retry modules.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, RetryCommands};
pub use presentation::{format_ingest_report, format_retry_keys, format_retry_status};
pub use route::RunContext;
