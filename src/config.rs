//! Configuration System
//!
//! Layered configuration for backends, generation policy, warm-up, publishing
//! and logging. Sources, lowest precedence first: built-in defaults, the
//! global file, workspace files, then `PROMPTCAST__SECTION__KEY` environment
//! variables. An explicit file replaces discovery but not the environment.

use crate::backend::{default_backends, BackendConfig};
use crate::error::ApiError;
use crate::generation::{RetryPolicy, WarmUpConfig};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptcastConfig {
    /// Directory generated images are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub warm_up: WarmUpSettings,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Backends keyed by identifier. Empty means the stock roster.
    #[serde(default)]
    pub backends: BTreeMap<String, BackendConfig>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for PromptcastConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            generation: GenerationConfig::default(),
            warm_up: WarmUpSettings::default(),
            credentials: CredentialsConfig::default(),
            catalog: CatalogConfig::default(),
            logging: LoggingConfig::default(),
            backends: BTreeMap::new(),
        }
    }
}

/// `[generation]`: retry budget and admission control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_per_attempt_timeout_secs")]
    pub per_attempt_timeout_secs: u64,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default)]
    pub fail_fast: bool,

    /// Upper bound on concurrently running work units; unset runs all at once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

fn default_max_retries() -> usize {
    6
}

fn default_per_attempt_timeout_secs() -> u64 {
    60
}

fn default_retry_delay_secs() -> u64 {
    3
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            per_attempt_timeout_secs: default_per_attempt_timeout_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            fail_fast: false,
            max_concurrency: None,
        }
    }
}

impl GenerationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            per_attempt_timeout: Duration::from_secs(self.per_attempt_timeout_secs),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            fail_fast: self.fail_fast,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.retry_policy().validate().map_err(|e| e.to_string())?;
        if self.max_concurrency == Some(0) {
            return Err("max_concurrency must be at least 1".to_string());
        }
        Ok(())
    }
}

/// `[warm_up]`: startup probing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmUpSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_probe_prompt")]
    pub probe_prompt: String,

    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_global_deadline_secs")]
    pub global_deadline_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_probe_prompt() -> String {
    "test".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    2
}

fn default_global_deadline_secs() -> u64 {
    10
}

impl Default for WarmUpSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_prompt: default_probe_prompt(),
            probe_timeout_secs: default_probe_timeout_secs(),
            global_deadline_secs: default_global_deadline_secs(),
        }
    }
}

impl WarmUpSettings {
    pub fn warm_up_config(&self) -> WarmUpConfig {
        WarmUpConfig {
            probe_prompt: self.probe_prompt.clone(),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            global_deadline: Duration::from_secs(self.global_deadline_secs),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.probe_prompt.trim().is_empty() {
            return Err("probe_prompt cannot be empty".to_string());
        }
        if self.probe_timeout_secs == 0 {
            return Err("probe_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// `[credentials]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Environment variable holding the inference API token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_token_env() -> String {
    "TOKEN".to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
        }
    }
}

/// `[catalog]`: JSON-lines record of published artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,

    #[serde(default = "default_category")]
    pub category: String,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("product_catalog.jsonl")
}

fn default_category() -> String {
    "Seamless Pattern".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_catalog_path(),
            category: default_category(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Output(String),
    Generation(String),
    WarmUp(String),
    Backend(String, String),
    Credentials(String),
    Catalog(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Output(msg) => write!(f, "Output: {}", msg),
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::WarmUp(msg) => write!(f, "Warm-up: {}", msg),
            ValidationError::Backend(id, msg) => write!(f, "Backend '{}': {}", id, msg),
            ValidationError::Credentials(msg) => write!(f, "Credentials: {}", msg),
            ValidationError::Catalog(msg) => write!(f, "Catalog: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PromptcastConfig {
    /// Validate the entire configuration, collecting every problem found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.output_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Output(
                "output_dir cannot be empty".to_string(),
            ));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.warm_up.validate() {
            errors.push(ValidationError::WarmUp(e));
        }
        for (id, backend) in &self.backends {
            if id.trim().is_empty() {
                errors.push(ValidationError::Backend(
                    id.clone(),
                    "Identifier cannot be empty".to_string(),
                ));
            }
            if let Err(e) = backend.validate() {
                errors.push(ValidationError::Backend(id.clone(), e));
            }
        }
        if self.credentials.token_env.trim().is_empty() {
            errors.push(ValidationError::Credentials(
                "token_env cannot be empty".to_string(),
            ));
        }
        if self.catalog.enabled && self.catalog.path.as_os_str().is_empty() {
            errors.push(ValidationError::Catalog(
                "path cannot be empty when the catalog is enabled".to_string(),
            ));
        }
        if let Err(e) = crate::logging::validate_config(&self.logging) {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one error
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }

    /// Configured backends, or the stock roster when none are configured
    pub fn effective_backends(&self) -> BTreeMap<String, BackendConfig> {
        if self.backends.is_empty() {
            default_backends()
        } else {
            self.backends.clone()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.generation.retry_policy()
    }

    pub fn warm_up_config(&self) -> WarmUpConfig {
        self.warm_up.warm_up_config()
    }

    /// Render the effective configuration as TOML, backends included.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        let mut effective = self.clone();
        effective.backends = self.effective_backends();
        toml::to_string_pretty(&effective)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
