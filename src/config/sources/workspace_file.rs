//! Workspace files: `config/config.toml`, then `config/<env>.toml` for the active environment.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

const ENV_VAR: &str = "PROMPTCAST_ENV";
const DEFAULT_ENV: &str = "development";

/// Active environment name (`PROMPTCAST_ENV`, else `development`).
pub fn environment_name() -> String {
    std::env::var(ENV_VAR)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string())
}

/// Workspace config files that exist, lowest precedence first.
pub fn existing_files(workspace_root: &Path, env_name: &str) -> Vec<PathBuf> {
    let dir = workspace_root.join("config");
    [dir.join("config.toml"), dir.join(format!("{}.toml", env_name))]
        .into_iter()
        .filter(|path| path.is_file())
        .collect()
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let files = existing_files(workspace_root, &environment_name());
    Ok(files.into_iter().fold(builder, |builder, path| {
        builder.add_source(File::from(path).required(false))
    }))
}
