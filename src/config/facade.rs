//! Config loader facade: builds the merged configuration from every source.

use crate::config::merge::builder_with_defaults;
use crate::config::sources::{env, global_file, workspace_file};
use crate::config::SheetpipeConfig;
use crate::error::ApiError;
use config::{Config, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Order: defaults, global file, workspace files, environment.
    pub fn load(workspace_root: &Path) -> Result<SheetpipeConfig, ApiError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = env::add_to_builder(builder);

        let config: SheetpipeConfig = builder.build()?.try_deserialize()?;
        config.ensure_valid()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from a single file, bypassing the layered sources.
    pub fn load_from_file(path: &Path) -> Result<SheetpipeConfig, ApiError> {
        let config: SheetpipeConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .build()?
            .try_deserialize()?;
        config.ensure_valid()?;
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
