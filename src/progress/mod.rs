//! Parse progress for one ingestion batch.

pub mod parse;

pub use parse::{ParseError, ParseProgress, ParseStage, ParseTracker};
