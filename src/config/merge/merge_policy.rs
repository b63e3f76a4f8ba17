//! Merge rules: built-in defaults at the bottom of the source stack.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("output_dir", "output")?
        .set_default("credentials.token_env", "TOKEN")?
        .set_default("generation.max_retries", 6)?
        .set_default("generation.per_attempt_timeout_secs", 60)?
        .set_default("generation.retry_delay_secs", 3)
}
