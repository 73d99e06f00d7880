//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; tables merge rather than replace.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    let builder = Config::builder()
        .set_default("batch.concurrency", crate::batch::DEFAULT_CONCURRENCY as i64)?
        .set_default("storage.store_path", ".sheetpipe/store")?;
    Ok(builder)
}
