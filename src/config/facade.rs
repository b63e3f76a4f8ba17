//! Config loading facade: assembles the source stack and deserializes it.

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::PromptcastConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`PromptcastConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from defaults, the global file, workspace files and the environment.
    pub fn load(workspace_root: &Path) -> Result<PromptcastConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        let config: PromptcastConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load from one explicit file instead of file discovery. Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<PromptcastConfig, ConfigError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder);
        let config: PromptcastConfig = builder.build()?.try_deserialize()?;
        debug!(config_path = %path.display(), "Configuration loaded from file");
        Ok(config)
    }

    /// Load from `path` when given, otherwise discover from `workspace_root`.
    pub fn resolve(
        workspace_root: &Path,
        path: Option<&Path>,
    ) -> Result<PromptcastConfig, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(workspace_root),
        }
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Built-in defaults only.
    pub fn defaults() -> PromptcastConfig {
        PromptcastConfig::default()
    }
}
