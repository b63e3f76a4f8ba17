//! Backend profiles: the serializable description of one backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 30;

/// Backend kind. Only the hosted inference API is wired up today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    #[default]
    HuggingFace,
}

impl BackendType {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendType::HuggingFace => "huggingface",
        }
    }
}

/// Configuration for a single image-generation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name shown in menus and used in artifact file names
    pub display_name: String,

    #[serde(default)]
    pub backend_type: BackendType,

    /// Model repository id on the inference service
    pub model: String,

    /// Base URL of the inference service
    #[serde(default)]
    pub endpoint: Option<String>,

    /// HTTP client timeout; the generation layer applies its own per-attempt bound on top
    #[serde(default = "default_client_timeout_secs")]
    pub client_timeout_secs: u64,
}

fn default_client_timeout_secs() -> u64 {
    DEFAULT_CLIENT_TIMEOUT_SECS
}

impl BackendConfig {
    pub fn new(display_name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            backend_type: BackendType::HuggingFace,
            model: model.into(),
            endpoint: None,
            client_timeout_secs: DEFAULT_CLIENT_TIMEOUT_SECS,
        }
    }

    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Validate backend configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.display_name.trim().is_empty() {
            return Err("Display name cannot be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "Endpoint must start with http:// or https://: {}",
                    endpoint
                ));
            }
        }
        if self.client_timeout_secs == 0 {
            return Err("Client timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// The stock roster used when no backends are configured.
pub fn default_backends() -> BTreeMap<String, BackendConfig> {
    let roster = [
        ("1", "Flux", "strangerzonehf/Flux-Midjourney-Mix2-LoRA"),
        ("2", "Midjourney", "Jovie/Midjourney"),
        ("3", "Seamless", "prithivMLmods/Seamless-Pattern-Design-Flux-LoRA"),
        ("4", "Nercy", "Nercy/flux-dalle"),
    ];
    roster
        .into_iter()
        .map(|(id, name, model)| (id.to_string(), BackendConfig::new(name, model)))
        .collect()
}
