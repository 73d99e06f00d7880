//! CLI parse: clap types for sheetpipe. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sheetpipe CLI - batch spreadsheet ingestion and chunk-load retry state
#[derive(Parser)]
#[command(name = "sheetpipe")]
#[command(about = "Bounded-concurrency spreadsheet ingestion with persisted retry control")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable logging
    #[arg(long)]
    pub quiet: bool,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes a file)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read and parse files in bounded-concurrency windows
    Ingest {
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Maximum files in flight (overrides batch.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect or clear persisted chunk-load retry state
    Retry {
        #[command(subcommand)]
        command: RetryCommands,
    },
}

#[derive(Subcommand)]
pub enum RetryCommands {
    /// Show the retry record for a storage key
    Status {
        /// Storage key of the retry record
        #[arg(long)]
        key: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Clear the retry record for a storage key
    Reset {
        /// Storage key of the retry record
        #[arg(long)]
        key: String,
    },
    /// List storage keys with a persisted record
    List,
}
